use crate::commands::orders::with_items;
use crate::config::AdminConfig;
use crate::db::Database;
use crate::error::{CanteenError, Result};
use crate::models::{CreateItem, DailySpecial, Item, OrderStatus, OrderWithItems};
use crate::money::Money;
use crate::store;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

pub fn verify_admin(admin: &AdminConfig, username: &str, password: &str) -> Result<()> {
    if username == admin.username && password == admin.password {
        info!("admin logged in");
        Ok(())
    } else {
        warn!(username, "rejected admin login");
        Err(CanteenError::Unauthorized)
    }
}

/// Every item, available or not, ordered by category then name.
pub fn get_all_items(db: &Database) -> Result<Vec<Item>> {
    let conn = db.lock()?;
    Ok(store::list_items(&conn)?)
}

/// Pending orders, oldest first, with student names and lines.
pub fn get_pending_orders(db: &Database) -> Result<Vec<OrderWithItems>> {
    let conn = db.lock()?;
    let orders = store::list_orders_by_status(&conn, OrderStatus::Pending)?;
    with_items(&conn, orders)
}

/// Flip an item's availability and return the new flag. Carts holding the
/// item are corrected on their next reconcile.
pub fn toggle_availability(db: &Database, item_id: i64) -> Result<bool> {
    let conn = db.lock()?;
    let available =
        store::toggle_item_availability(&conn, item_id)?.ok_or(CanteenError::ItemNotFound(item_id))?;

    info!(item_id, available, "item availability toggled");
    Ok(available)
}

/// Set an order's status. Only the known statuses are accepted; any status
/// may follow any other.
pub fn set_order_status(db: &Database, order_id: i64, status: &str) -> Result<OrderStatus> {
    let status: OrderStatus = status.trim().parse()?;
    let conn = db.lock()?;

    if !store::update_order_status(&conn, order_id, status)? {
        return Err(CanteenError::OrderNotFound(order_id));
    }

    info!(order_id, %status, "order status updated");
    Ok(status)
}

/// Highest list price an item may carry (1,000,000.00).
pub const MAX_ITEM_PRICE: Money = Money::from_minor(100_000_000);

pub fn create_item(db: &Database, item: CreateItem) -> Result<Item> {
    debug!(name = %item.name, price = %item.price, "create_item");
    if item.price < Money::ZERO || item.price > MAX_ITEM_PRICE {
        return Err(CanteenError::InvalidPrice {
            price: item.price,
            max: MAX_ITEM_PRICE,
        });
    }

    let conn = db.lock()?;
    let id = store::insert_item(&conn, &item)?;

    Ok(Item {
        id,
        name: item.name,
        category: item.category,
        price: item.price,
        is_available: true,
    })
}

/// Discount an item on one date, replacing any discount already set for it.
pub fn set_daily_special(
    db: &Database,
    item_id: i64,
    date: NaiveDate,
    discount_percent: Decimal,
) -> Result<DailySpecial> {
    if discount_percent < Decimal::ZERO || discount_percent > Decimal::ONE_HUNDRED {
        return Err(CanteenError::InvalidDiscount(discount_percent));
    }

    let conn = db.lock()?;
    if store::get_availability(&conn, item_id)?.is_none() {
        return Err(CanteenError::ItemNotFound(item_id));
    }
    store::set_daily_special(&conn, item_id, date, discount_percent)?;

    info!(item_id, %date, %discount_percent, "daily special set");
    Ok(DailySpecial {
        item_id,
        date,
        discount_percent,
    })
}
