use crate::money::Money;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CanteenError {
    #[error("Quantity must be positive, got {0}")]
    InvalidQuantity(i64),

    #[error("Item {0} not found or unavailable")]
    ItemUnavailable(i64),

    #[error("Price must be between 0.00 and {max}, got {price}")]
    InvalidPrice { price: Money, max: Money },

    #[error("Amount too large")]
    AmountOverflow,

    #[error("Item {0} not found")]
    ItemNotFound(i64),

    #[error("Order {0} not found")]
    OrderNotFound(i64),

    #[error("Insufficient wallet balance: order total {needed}, balance {available}")]
    InsufficientBalance { needed: Money, available: Money },

    #[error("Your cart is empty")]
    EmptyCart,

    #[error("Invalid student ID, or student is not authorized to order")]
    InvalidLogin,

    #[error("Invalid admin credentials")]
    Unauthorized,

    #[error("Unknown order status: {0}")]
    InvalidStatus(String),

    #[error("Unknown payment mode: {0}")]
    InvalidPaymentMode(String),

    #[error("Discount must be between 0 and 100 percent, got {0}")]
    InvalidDiscount(Decimal),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[from] rusqlite::Error),

    #[error("Store lock poisoned")]
    LockPoisoned,

    #[error("Checkout failed: {0}")]
    TransactionFailed(#[source] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl CanteenError {
    /// Failures of the store itself; the caller may retry the same action.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CanteenError::StoreUnavailable(_)
                | CanteenError::LockPoisoned
                | CanteenError::TransactionFailed(_)
        )
    }

    /// Text safe to show to a student. Store failures are reported generically.
    pub fn user_message(&self) -> String {
        match self {
            CanteenError::TransactionFailed(_) => {
                "An error occurred during checkout. Please try again.".to_string()
            }
            CanteenError::StoreUnavailable(_) | CanteenError::LockPoisoned => {
                "Database connection error. Please contact administrator.".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for CanteenError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        CanteenError::LockPoisoned
    }
}

pub type Result<T, E = CanteenError> = std::result::Result<T, E>;
