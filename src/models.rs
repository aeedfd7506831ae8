use crate::error::CanteenError;
use crate::money::Money;
use chrono::{NaiveDate, NaiveTime};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub price: Money,
    pub is_available: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateItem {
    pub name: String,
    pub category: String,
    pub price: Money,
}

/// Item with its price resolved for a given day.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PricedItem {
    pub item_id: i64,
    pub name: String,
    pub category: String,
    pub unit_price: Money,
    pub is_available: bool,
    pub is_special: bool,
    pub discount_percent: Option<Decimal>,
    pub discounted_price: Money,
}

impl PricedItem {
    pub fn new(item: Item, discount_percent: Option<Decimal>) -> Self {
        let discounted_price = match discount_percent {
            Some(percent) => item.price.discounted(percent),
            None => item.price,
        };
        PricedItem {
            item_id: item.id,
            name: item.name,
            category: item.category,
            unit_price: item.price,
            is_available: item.is_available,
            is_special: discount_percent.is_some(),
            discount_percent,
            discounted_price,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct DailySpecial {
    pub item_id: i64,
    pub date: NaiveDate,
    pub discount_percent: Decimal,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct MenuCategory {
    pub category: String,
    pub items: Vec<PricedItem>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Student {
    pub student_id: String,
    pub name: String,
    pub department: String,
    pub year: u8,
    pub balance: Money,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Order {
    pub id: i64,
    pub student_id: String,
    pub student_name: Option<String>,
    pub order_date: NaiveDate,
    pub order_time: NaiveTime,
    pub total: Money,
    pub status: OrderStatus,
    pub payment_mode: Option<PaymentMode>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub item_id: i64,
    pub item_name: Option<String>,
    pub quantity: u32,
    pub subtotal: Money,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Payment {
    pub id: i64,
    pub order_id: i64,
    pub mode: PaymentMode,
    pub amount: Money,
    pub status: PaymentStatus,
    pub transaction_date: NaiveDate,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    Pending,
    Preparing,
    Ready,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Preparing => "Preparing",
            OrderStatus::Ready => "Ready",
            OrderStatus::Completed => "Completed",
            OrderStatus::Cancelled => "Cancelled",
        }
    }
}

impl FromStr for OrderStatus {
    type Err = CanteenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(OrderStatus::Pending),
            "Preparing" => Ok(OrderStatus::Preparing),
            "Ready" => Ok(OrderStatus::Ready),
            "Completed" => Ok(OrderStatus::Completed),
            "Cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(CanteenError::InvalidStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaymentMode {
    Cash,
    #[serde(rename = "UPI")]
    Upi,
    Card,
    Wallet,
}

impl PaymentMode {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMode::Cash => "Cash",
            PaymentMode::Upi => "UPI",
            PaymentMode::Card => "Card",
            PaymentMode::Wallet => "Wallet",
        }
    }

    /// Cash is settled at the counter; every other mode is paid up front.
    pub fn settlement_status(self) -> PaymentStatus {
        match self {
            PaymentMode::Cash => PaymentStatus::Pending,
            PaymentMode::Upi | PaymentMode::Card | PaymentMode::Wallet => PaymentStatus::Completed,
        }
    }
}

impl FromStr for PaymentMode {
    type Err = CanteenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Cash" => Ok(PaymentMode::Cash),
            "UPI" => Ok(PaymentMode::Upi),
            "Card" => Ok(PaymentMode::Card),
            "Wallet" => Ok(PaymentMode::Wallet),
            other => Err(CanteenError::InvalidPaymentMode(other.to_string())),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaymentStatus {
    Pending,
    Completed,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Completed => "Completed",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = CanteenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(PaymentStatus::Pending),
            "Completed" => Ok(PaymentStatus::Completed),
            other => Err(CanteenError::InvalidStatus(other.to_string())),
        }
    }
}

macro_rules! text_column {
    ($($ty:ty),*) => {$(
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $ty {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e: CanteenError| FromSqlError::Other(Box::new(e)))
            }
        }
    )*};
}

text_column!(OrderStatus, PaymentMode, PaymentStatus);
