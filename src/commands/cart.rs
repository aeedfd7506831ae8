//! Student cart: add, update, remove, and reconciliation against the live
//! catalog.
//!
//! The cart is a plain value owned by the student's session. Every
//! operation takes it as `&mut Cart`; a failed operation leaves it as it was.

use crate::clock::Clock;
use crate::db::Database;
use crate::error::{CanteenError, Result};
use crate::models::PricedItem;
use crate::money::Money;
use crate::store;
use chrono::NaiveDate;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, warn};

/// One line of the cart. Display fields are a cache of the catalog and are
/// refreshed on every reconcile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub item_id: i64,
    pub item_name: String,
    pub unit_price: Money,
    pub discounted_price: Money,
    pub is_special: bool,
    pub quantity: u32,
    pub line_total: Money,
}

impl CartLine {
    fn new(item: &PricedItem, quantity: u32) -> Result<Self> {
        Ok(CartLine {
            item_id: item.item_id,
            item_name: item.name.clone(),
            unit_price: item.unit_price,
            discounted_price: item.discounted_price,
            is_special: item.is_special,
            quantity,
            line_total: line_total(item.discounted_price, quantity)?,
        })
    }

    fn refresh(&mut self, item: &PricedItem) -> Result<()> {
        self.line_total = line_total(item.discounted_price, self.quantity)?;
        self.item_name = item.name.clone();
        self.unit_price = item.unit_price;
        self.discounted_price = item.discounted_price;
        self.is_special = item.is_special;
        Ok(())
    }

    fn set_quantity(&mut self, quantity: u32) -> Result<()> {
        self.line_total = line_total(self.discounted_price, quantity)?;
        self.quantity = quantity;
        Ok(())
    }
}

fn line_total(price: Money, quantity: u32) -> Result<Money> {
    price
        .checked_times(quantity)
        .ok_or(CanteenError::AmountOverflow)
}

/// Lines in insertion order, at most one per item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn line(&self, item_id: i64) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.item_id == item_id)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of distinct items.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Total units across all lines.
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Sum of cached line totals. Only trustworthy right after a reconcile.
    pub fn total(&self) -> Result<Money> {
        Money::checked_sum(self.lines.iter().map(|l| l.line_total))
            .ok_or(CanteenError::AmountOverflow)
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    fn line_mut(&mut self, item_id: i64) -> Option<&mut CartLine> {
        self.lines.iter_mut().find(|l| l.item_id == item_id)
    }

    fn take(&mut self, item_id: i64) -> Option<CartLine> {
        let index = self.lines.iter().position(|l| l.item_id == item_id)?;
        Some(self.lines.remove(index))
    }
}

/// Informational message produced by a cart operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Notice {
    Added { item_name: String, quantity: u32 },
    QuantityUpdated { item_name: String, quantity: u32 },
    Removed { item_name: String },
    NoLongerAvailable { item_name: String },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Added { item_name, quantity } => {
                write!(f, "{quantity} x {item_name} added to cart.")
            }
            Notice::QuantityUpdated { item_name, quantity } => {
                write!(f, "Quantity for {item_name} updated to {quantity}.")
            }
            Notice::Removed { item_name } => write!(f, "{item_name} removed from cart."),
            Notice::NoLongerAvailable { item_name } => {
                write!(f, "'{item_name}' is no longer available and was removed.")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconciliation {
    pub total: Money,
    pub notices: Vec<Notice>,
}

/// Most units of one item a cart line may hold.
pub const MAX_LINE_QUANTITY: u32 = 1_000;

fn positive_quantity(quantity: i64) -> Result<u32> {
    u32::try_from(quantity)
        .ok()
        .filter(|q| (1..=MAX_LINE_QUANTITY).contains(q))
        .ok_or(CanteenError::InvalidQuantity(quantity))
}

/// Add `quantity` units of an item. An item already in the cart has its
/// quantity increased; its cached prices are left for the next reconcile.
pub fn add_to_cart(
    db: &Database,
    cart: &mut Cart,
    item_id: i64,
    quantity: i64,
    clock: &dyn Clock,
) -> Result<Notice> {
    debug!(item_id, quantity, "add_to_cart");
    let quantity = positive_quantity(quantity)?;

    let resolved = {
        let conn = db.lock()?;
        store::resolve_item(&conn, item_id, clock.today())?
    };
    let item = resolved
        .filter(|item| item.is_available)
        .ok_or(CanteenError::ItemUnavailable(item_id))?;

    match cart.line_mut(item_id) {
        Some(line) => {
            let total = line.quantity + quantity;
            if total > MAX_LINE_QUANTITY {
                return Err(CanteenError::InvalidQuantity(i64::from(total)));
            }
            line.set_quantity(total)?;
        }
        None => cart.lines.push(CartLine::new(&item, quantity)?),
    }

    Ok(Notice::Added {
        item_name: item.name,
        quantity,
    })
}

/// Set a line's quantity in place. Zero or less removes the line; an item
/// not in the cart is ignored.
pub fn update_cart_item(cart: &mut Cart, item_id: i64, quantity: i64) -> Result<Option<Notice>> {
    debug!(item_id, quantity, "update_cart_item");

    if quantity <= 0 {
        return Ok(remove_from_cart(cart, item_id));
    }
    let quantity = positive_quantity(quantity)?;

    let Some(line) = cart.line_mut(item_id) else {
        return Ok(None);
    };
    line.set_quantity(quantity)?;
    Ok(Some(Notice::QuantityUpdated {
        item_name: line.item_name.clone(),
        quantity,
    }))
}

pub fn remove_from_cart(cart: &mut Cart, item_id: i64) -> Option<Notice> {
    debug!(item_id, "remove_from_cart");
    cart.take(item_id).map(|line| Notice::Removed {
        item_name: line.item_name,
    })
}

/// Revalidate every line against the catalog as of today. Lines whose item
/// is gone or unavailable are dropped for good; the rest are repriced.
pub fn reconcile_cart(db: &Database, cart: &mut Cart, clock: &dyn Clock) -> Result<Reconciliation> {
    let conn = db.lock()?;
    reconcile_with(&conn, cart, clock.today())
}

pub(crate) fn reconcile_with(
    conn: &Connection,
    cart: &mut Cart,
    date: NaiveDate,
) -> Result<Reconciliation> {
    if cart.is_empty() {
        return Ok(Reconciliation {
            total: Money::ZERO,
            notices: Vec::new(),
        });
    }

    let mut ids: Vec<i64> = cart.lines.iter().map(|l| l.item_id).collect();
    ids.sort_unstable();
    ids.dedup();

    let live: HashMap<i64, PricedItem> = store::resolve_items(conn, &ids, date)?
        .into_iter()
        .map(|item| (item.item_id, item))
        .collect();

    let mut notices = Vec::new();
    let mut kept = Vec::with_capacity(cart.lines.len());

    // Build the new lines aside so an error leaves the cart untouched
    for line in &cart.lines {
        match live.get(&line.item_id) {
            Some(item) if item.is_available => {
                let mut line = line.clone();
                line.refresh(item)?;
                kept.push(line);
            }
            found => {
                let item_name = found.map_or_else(|| line.item_name.clone(), |i| i.name.clone());
                warn!(item_id = line.item_id, %item_name, "dropping unavailable item from cart");
                notices.push(Notice::NoLongerAvailable { item_name });
            }
        }
    }

    let total =
        Money::checked_sum(kept.iter().map(|l| l.line_total)).ok_or(CanteenError::AmountOverflow)?;
    cart.lines = kept;
    Ok(Reconciliation { total, notices })
}
