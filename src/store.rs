//! Store primitives over a single connection.
//!
//! Every function takes a `&Connection`, so a `rusqlite::Transaction`
//! (which derefs to `Connection`) can run them as one atomic unit.

use crate::models::{
    CreateItem, Item, Order, OrderItem, OrderStatus, Payment, PaymentMode, PaymentStatus,
    PricedItem, Student,
};
use crate::money::Money;
use chrono::{NaiveDate, NaiveTime};
use rusqlite::types::{ToSql, Type};
use rusqlite::{params, Connection, OptionalExtension, Result, Row};
use rust_decimal::Decimal;
use std::str::FromStr;

const PRICED_ITEM_COLUMNS: &str = "i.id, i.name, i.category, i.price_cents, i.is_available, ds.discount_percent
     FROM items i
     LEFT JOIN daily_specials ds ON ds.item_id = i.id AND ds.date = ?1";

fn priced_item_from_row(row: &Row<'_>) -> Result<PricedItem> {
    let item = Item {
        id: row.get(0)?,
        name: row.get(1)?,
        category: row.get(2)?,
        price: row.get(3)?,
        is_available: row.get(4)?,
    };
    let percent = row
        .get::<_, Option<String>>(5)?
        .map(|raw| parse_percent(5, &raw))
        .transpose()?;
    Ok(PricedItem::new(item, percent))
}

fn parse_percent(idx: usize, raw: &str) -> Result<Decimal> {
    Decimal::from_str(raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

// ===== CATALOG =====

/// Resolve pricing for `ids` on `date` in one query. Unknown ids are
/// simply absent from the result.
pub fn resolve_items(conn: &Connection, ids: &[i64], date: NaiveDate) -> Result<Vec<PricedItem>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = (0..ids.len())
        .map(|i| format!("?{}", i + 2))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!("SELECT {PRICED_ITEM_COLUMNS} WHERE i.id IN ({placeholders})");

    let mut params: Vec<&dyn ToSql> = Vec::with_capacity(ids.len() + 1);
    params.push(&date);
    params.extend(ids.iter().map(|id| id as &dyn ToSql));

    let mut stmt = conn.prepare(&sql)?;
    let items = stmt
        .query_map(params.as_slice(), priced_item_from_row)?
        .collect::<Result<Vec<_>>>()?;
    Ok(items)
}

pub fn resolve_item(conn: &Connection, id: i64, date: NaiveDate) -> Result<Option<PricedItem>> {
    Ok(resolve_items(conn, &[id], date)?.into_iter().next())
}

/// Available items priced for `date`, ordered by category then name.
pub fn list_menu(conn: &Connection, date: NaiveDate, specials_only: bool) -> Result<Vec<PricedItem>> {
    let filter = if specials_only {
        "AND ds.item_id IS NOT NULL"
    } else {
        ""
    };
    let sql = format!(
        "SELECT {PRICED_ITEM_COLUMNS}
         WHERE i.is_available = 1 {filter}
         ORDER BY i.category, i.name"
    );

    let mut stmt = conn.prepare(&sql)?;
    let items = stmt
        .query_map([date], priced_item_from_row)?
        .collect::<Result<Vec<_>>>()?;
    Ok(items)
}

pub fn list_items(conn: &Connection) -> Result<Vec<Item>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, category, price_cents, is_available
         FROM items
         ORDER BY category, name",
    )?;
    let items = stmt
        .query_map([], |row| {
            Ok(Item {
                id: row.get(0)?,
                name: row.get(1)?,
                category: row.get(2)?,
                price: row.get(3)?,
                is_available: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>>>()?;
    Ok(items)
}

pub fn get_availability(conn: &Connection, item_id: i64) -> Result<Option<bool>> {
    conn.query_row(
        "SELECT is_available FROM items WHERE id = ?1",
        [item_id],
        |row| row.get(0),
    )
    .optional()
}

/// Flip availability; returns the new flag, or `None` for an unknown item.
pub fn toggle_item_availability(conn: &Connection, item_id: i64) -> Result<Option<bool>> {
    let changed = conn.execute(
        "UPDATE items SET is_available = 1 - is_available WHERE id = ?1",
        [item_id],
    )?;
    if changed == 0 {
        return Ok(None);
    }
    get_availability(conn, item_id)
}

pub fn insert_item(conn: &Connection, item: &CreateItem) -> Result<i64> {
    conn.execute(
        "INSERT INTO items (name, category, price_cents, is_available) VALUES (?1, ?2, ?3, 1)",
        params![item.name, item.category, item.price],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Insert or replace the discount for one item on one date.
pub fn set_daily_special(
    conn: &Connection,
    item_id: i64,
    date: NaiveDate,
    discount_percent: Decimal,
) -> Result<()> {
    conn.execute(
        "INSERT INTO daily_specials (item_id, date, discount_percent) VALUES (?1, ?2, ?3)
         ON CONFLICT (item_id, date) DO UPDATE SET discount_percent = excluded.discount_percent",
        params![item_id, date, discount_percent.to_string()],
    )?;
    Ok(())
}

// ===== STUDENTS =====

pub fn insert_student(conn: &Connection, student: &Student) -> Result<()> {
    conn.execute(
        "INSERT INTO students (student_id, name, department, year, balance_cents)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            student.student_id,
            student.name,
            student.department,
            student.year,
            student.balance
        ],
    )?;
    Ok(())
}

pub fn get_student(conn: &Connection, student_id: &str) -> Result<Option<Student>> {
    conn.query_row(
        "SELECT student_id, name, department, year, balance_cents FROM students WHERE student_id = ?1",
        [student_id],
        |row| {
            Ok(Student {
                student_id: row.get(0)?,
                name: row.get(1)?,
                department: row.get(2)?,
                year: row.get(3)?,
                balance: row.get(4)?,
            })
        },
    )
    .optional()
}

pub fn get_wallet_balance(conn: &Connection, student_id: &str) -> Result<Option<Money>> {
    conn.query_row(
        "SELECT balance_cents FROM students WHERE student_id = ?1",
        [student_id],
        |row| row.get(0),
    )
    .optional()
}

/// Compare-and-swap the balance. Returns `false` if the stored balance is
/// no longer `expected`.
pub fn set_wallet_balance(
    conn: &Connection,
    student_id: &str,
    balance: Money,
    expected: Money,
) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE students SET balance_cents = ?1 WHERE student_id = ?2 AND balance_cents = ?3",
        params![balance, student_id, expected],
    )?;
    Ok(changed == 1)
}

// ===== ORDERS =====

pub fn insert_order(
    conn: &Connection,
    student_id: &str,
    date: NaiveDate,
    time: NaiveTime,
    total: Money,
    status: OrderStatus,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO orders (student_id, order_date, order_time, total_cents, status)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![student_id, date, time, total, status],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn insert_payment(
    conn: &Connection,
    order_id: i64,
    mode: PaymentMode,
    amount: Money,
    status: PaymentStatus,
    date: NaiveDate,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO payments (order_id, payment_mode, amount_cents, payment_status, transaction_date)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![order_id, mode, amount, status, date],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn insert_order_item(
    conn: &Connection,
    order_id: i64,
    item_id: i64,
    quantity: u32,
    subtotal: Money,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO order_items (order_id, item_id, quantity, subtotal_cents) VALUES (?1, ?2, ?3, ?4)",
        params![order_id, item_id, quantity, subtotal],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Returns `false` if no order has that id.
pub fn update_order_status(conn: &Connection, order_id: i64, status: OrderStatus) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE orders SET status = ?1 WHERE id = ?2",
        params![status, order_id],
    )?;
    Ok(changed == 1)
}

const ORDER_COLUMNS: &str = "o.id, o.student_id, s.name, o.order_date, o.order_time, o.total_cents, o.status, p.payment_mode
     FROM orders o
     LEFT JOIN students s ON o.student_id = s.student_id
     LEFT JOIN payments p ON p.order_id = o.id";

fn order_from_row(row: &Row<'_>) -> Result<Order> {
    Ok(Order {
        id: row.get(0)?,
        student_id: row.get(1)?,
        student_name: row.get(2)?,
        order_date: row.get(3)?,
        order_time: row.get(4)?,
        total: row.get(5)?,
        status: row.get(6)?,
        payment_mode: row.get(7)?,
    })
}

pub fn get_order(conn: &Connection, order_id: i64) -> Result<Option<Order>> {
    conn.query_row(
        &format!("SELECT {ORDER_COLUMNS} WHERE o.id = ?1"),
        [order_id],
        order_from_row,
    )
    .optional()
}

pub fn list_student_orders(conn: &Connection, student_id: &str) -> Result<Vec<Order>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ORDER_COLUMNS}
         WHERE o.student_id = ?1
         ORDER BY o.order_date DESC, o.order_time DESC, o.id DESC"
    ))?;
    let orders = stmt
        .query_map([student_id], order_from_row)?
        .collect::<Result<Vec<_>>>()?;
    Ok(orders)
}

pub fn list_orders_by_status(conn: &Connection, status: OrderStatus) -> Result<Vec<Order>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ORDER_COLUMNS}
         WHERE o.status = ?1
         ORDER BY o.order_date ASC, o.order_time ASC, o.id ASC"
    ))?;
    let orders = stmt
        .query_map([status], order_from_row)?
        .collect::<Result<Vec<_>>>()?;
    Ok(orders)
}

pub fn list_order_items(conn: &Connection, order_id: i64) -> Result<Vec<OrderItem>> {
    let mut stmt = conn.prepare(
        "SELECT oi.id, oi.order_id, oi.item_id, i.name, oi.quantity, oi.subtotal_cents
         FROM order_items oi
         LEFT JOIN items i ON oi.item_id = i.id
         WHERE oi.order_id = ?1
         ORDER BY oi.id",
    )?;
    let items = stmt
        .query_map([order_id], |row| {
            Ok(OrderItem {
                id: row.get(0)?,
                order_id: row.get(1)?,
                item_id: row.get(2)?,
                item_name: row.get(3)?,
                quantity: row.get(4)?,
                subtotal: row.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>>>()?;
    Ok(items)
}

pub fn get_payment(conn: &Connection, order_id: i64) -> Result<Option<Payment>> {
    conn.query_row(
        "SELECT id, order_id, payment_mode, amount_cents, payment_status, transaction_date
         FROM payments WHERE order_id = ?1",
        [order_id],
        |row| {
            Ok(Payment {
                id: row.get(0)?,
                order_id: row.get(1)?,
                mode: row.get(2)?,
                amount: row.get(3)?,
                status: row.get(4)?,
                transaction_date: row.get(5)?,
            })
        },
    )
    .optional()
}
