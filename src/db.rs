use crate::error::CanteenError;
use rusqlite::{Connection, Result};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

pub struct Database {
    pub conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CanteenError> {
        let path = path.as_ref();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }

        let conn = Connection::open(path)?;
        Ok(Self::from_connection(conn)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Database {
            conn: Mutex::new(conn),
        })
    }

    pub fn lock(&self) -> Result<MutexGuard<'_, Connection>, CanteenError> {
        Ok(self.conn.lock()?)
    }

    pub fn initialize(&self) -> Result<(), CanteenError> {
        let conn = self.lock()?;

        conn.execute_batch(
            "
            -- Roster of students allowed to order, with wallet balance
            CREATE TABLE IF NOT EXISTS students (
                student_id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                department TEXT NOT NULL,
                year INTEGER NOT NULL,
                balance_cents INTEGER NOT NULL DEFAULT 0
            );

            -- Menu items
            CREATE TABLE IF NOT EXISTS items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                category TEXT NOT NULL,
                price_cents INTEGER NOT NULL,
                is_available INTEGER NOT NULL DEFAULT 1
            );

            -- Per-day discounts
            CREATE TABLE IF NOT EXISTS daily_specials (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                item_id INTEGER NOT NULL,
                date DATE NOT NULL,
                discount_percent TEXT NOT NULL,
                UNIQUE (item_id, date),
                FOREIGN KEY (item_id) REFERENCES items(id)
            );

            -- Orders
            CREATE TABLE IF NOT EXISTS orders (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                student_id TEXT NOT NULL,
                order_date DATE NOT NULL,
                order_time TEXT NOT NULL,
                total_cents INTEGER NOT NULL,
                status TEXT NOT NULL DEFAULT 'Pending',
                FOREIGN KEY (student_id) REFERENCES students(student_id)
            );

            -- One payment per order
            CREATE TABLE IF NOT EXISTS payments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                order_id INTEGER NOT NULL UNIQUE,
                payment_mode TEXT NOT NULL,
                amount_cents INTEGER NOT NULL,
                payment_status TEXT NOT NULL,
                transaction_date DATE NOT NULL,
                FOREIGN KEY (order_id) REFERENCES orders(id)
            );

            -- Order items, priced at time of purchase
            CREATE TABLE IF NOT EXISTS order_items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                order_id INTEGER NOT NULL,
                item_id INTEGER NOT NULL,
                quantity INTEGER NOT NULL,
                subtotal_cents INTEGER NOT NULL,
                FOREIGN KEY (order_id) REFERENCES orders(id),
                FOREIGN KEY (item_id) REFERENCES items(id)
            );
            ",
        )?;

        // Run migrations for existing databases (pass connection to avoid deadlock)
        Self::migrate_conn(&conn)?;

        Ok(())
    }

    fn migrate_conn(conn: &Connection) -> Result<()> {
        // Databases created before availability toggling lack the flag
        let columns: Vec<String> = conn
            .prepare("PRAGMA table_info(items)")?
            .query_map([], |row| row.get::<_, String>(1))?
            .filter_map(|r| r.ok())
            .collect();

        if !columns.contains(&"is_available".to_string()) {
            conn.execute(
                "ALTER TABLE items ADD COLUMN is_available INTEGER NOT NULL DEFAULT 1",
                [],
            )?;
        }

        conn.execute_batch(
            "
            CREATE INDEX IF NOT EXISTS idx_orders_student ON orders(student_id);
            CREATE INDEX IF NOT EXISTS idx_orders_status ON orders(status);
            CREATE INDEX IF NOT EXISTS idx_order_items_order ON order_items(order_id);
            ",
        )?;

        Ok(())
    }
}
