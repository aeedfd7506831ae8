use crate::clock::Clock;
use crate::db::Database;
use crate::error::Result;
use crate::models::{MenuCategory, PricedItem};
use crate::store;
use chrono::NaiveDate;
use tracing::debug;

/// Effective prices for `ids` on `date`. Ids that do not resolve are
/// left out; callers treat them as unavailable.
pub fn resolve_prices(db: &Database, ids: &[i64], date: NaiveDate) -> Result<Vec<PricedItem>> {
    let conn = db.lock()?;
    Ok(store::resolve_items(&conn, ids, date)?)
}

/// Available items with today's pricing, grouped by category.
pub fn get_menu(db: &Database, clock: &dyn Clock) -> Result<Vec<MenuCategory>> {
    let today = clock.today();
    debug!(%today, "get_menu");

    let conn = db.lock()?;
    let items = store::list_menu(&conn, today, false)?;
    Ok(group_by_category(items))
}

/// Only the items discounted today.
pub fn get_daily_specials(db: &Database, clock: &dyn Clock) -> Result<Vec<MenuCategory>> {
    let today = clock.today();
    debug!(%today, "get_daily_specials");

    let conn = db.lock()?;
    let items = store::list_menu(&conn, today, true)?;
    Ok(group_by_category(items))
}

// Input must already be sorted by category.
fn group_by_category(items: Vec<PricedItem>) -> Vec<MenuCategory> {
    let mut categories: Vec<MenuCategory> = Vec::new();
    for item in items {
        match categories.last_mut() {
            Some(group) if group.category == item.category => group.items.push(item),
            _ => categories.push(MenuCategory {
                category: item.category.clone(),
                items: vec![item],
            }),
        }
    }
    categories
}
