use crate::commands::cart::Cart;
use crate::config::RosterConfig;
use crate::db::Database;
use crate::error::{CanteenError, Result};
use crate::money::Money;
use crate::store;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// A logged-in student and their cart. Serializable so a web layer can keep
/// it in whatever session storage it uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub student_id: String,
    pub student_name: String,
    pub cart: Cart,
}

impl Session {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

/// Log in by roster lookup: the id must belong to a student of the
/// configured department and years. Starts with an empty cart.
pub fn login(db: &Database, roster: &RosterConfig, raw_id: &str) -> Result<Session> {
    let student_id = raw_id.trim().to_uppercase();
    debug!(%student_id, "login");

    let conn = db.lock()?;
    let student = store::get_student(&conn, &student_id)?
        .filter(|s| s.department == roster.department && roster.years.contains(&s.year))
        .ok_or(CanteenError::InvalidLogin)?;

    info!(student_id = %student.student_id, "student logged in");
    Ok(Session {
        student_id: student.student_id,
        student_name: student.name,
        cart: Cart::new(),
    })
}

/// Current wallet balance; an unknown student has none.
pub fn get_wallet_balance(db: &Database, student_id: &str) -> Result<Money> {
    let conn = db.lock()?;
    Ok(store::get_wallet_balance(&conn, student_id)?.unwrap_or(Money::ZERO))
}
