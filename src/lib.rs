pub mod clock;
pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod money;
pub mod store;


use clock::SystemClock;
use commands::{admin, menu};
use config::Config;
use db::Database;
use error::CanteenError;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use commands::cart::{Cart, CartLine, Notice};
pub use commands::checkout::CheckoutReceipt;
pub use commands::students::Session;
pub use error::Result;
pub use money::Money;

/// Load configuration, open and migrate the store, and report what is on
/// today's menu.
pub fn run() -> Result<(), CanteenError> {
    load_dotenv()?;
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_filter.as_str())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(path = %config.database_path.display(), "opening canteen database");
    let db = Database::open(&config.database_path)?;
    db.initialize()?;

    let clock = SystemClock;
    let categories = menu::get_menu(&db, &clock)?;
    let specials = menu::get_daily_specials(&db, &clock)?;
    let pending = admin::get_pending_orders(&db)?;

    info!(
        categories = categories.len(),
        items = categories.iter().map(|c| c.items.len()).sum::<usize>(),
        specials = specials.iter().map(|c| c.items.len()).sum::<usize>(),
        pending_orders = pending.len(),
        "canteen ready"
    );

    Ok(())
}

/// Load `.env` if there is one. A missing file is fine; a malformed one is
/// an error.
fn load_dotenv() -> Result<(), CanteenError> {
    dotenv_outcome(dotenvy::dotenv())
}

pub(crate) fn dotenv_outcome<T>(loaded: dotenvy::Result<T>) -> Result<(), CanteenError> {
    match loaded {
        Ok(_) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(CanteenError::Config(format!("failed to load .env: {e}"))),
    }
}
