use crate::db::Database;
use crate::error::{CanteenError, Result};
use crate::models::{Order, OrderWithItems, Payment};
use crate::store;
use rusqlite::Connection;
use tracing::debug;

pub(crate) fn with_items(conn: &Connection, orders: Vec<Order>) -> Result<Vec<OrderWithItems>> {
    let mut result = Vec::with_capacity(orders.len());
    for order in orders {
        let items = store::list_order_items(conn, order.id)?;
        result.push(OrderWithItems { order, items });
    }
    Ok(result)
}

/// One of the student's own orders, as shown after checkout.
pub fn get_order_receipt(db: &Database, student_id: &str, order_id: i64) -> Result<OrderWithItems> {
    debug!(student_id, order_id, "get_order_receipt");
    let conn = db.lock()?;

    let order = store::get_order(&conn, order_id)?
        .filter(|order| order.student_id == student_id)
        .ok_or(CanteenError::OrderNotFound(order_id))?;
    let items = store::list_order_items(&conn, order_id)?;

    Ok(OrderWithItems { order, items })
}

/// All of a student's orders, newest first.
pub fn get_order_history(db: &Database, student_id: &str) -> Result<Vec<OrderWithItems>> {
    debug!(student_id, "get_order_history");
    let conn = db.lock()?;

    let orders = store::list_student_orders(&conn, student_id)?;
    with_items(&conn, orders)
}

pub fn get_payment(db: &Database, order_id: i64) -> Result<Payment> {
    let conn = db.lock()?;
    store::get_payment(&conn, order_id)?.ok_or(CanteenError::OrderNotFound(order_id))
}
