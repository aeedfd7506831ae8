use crate::clock::Clock;
use crate::commands::cart::{reconcile_with, Cart, Notice};
use crate::db::Database;
use crate::error::{CanteenError, Result};
use crate::models::{OrderStatus, PaymentMode, PaymentStatus};
use crate::money::Money;
use crate::store;
use rusqlite::{Connection, TransactionBehavior};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutReceipt {
    pub order_id: i64,
    pub total: Money,
    pub payment_mode: PaymentMode,
    pub payment_status: PaymentStatus,
    /// Balance after the debit, for wallet payments only
    pub wallet_balance: Option<Money>,
    /// Lines dropped while reconciling before the order was placed
    pub notices: Vec<Notice>,
}

/// Place an order for everything in the cart.
///
/// The cart is reconciled first. Order, payment, order items and the wallet
/// debit are then written in one transaction; on any failure nothing is
/// written and the (reconciled) cart is left intact. On success the cart is
/// emptied.
pub fn checkout(
    db: &Database,
    student_id: &str,
    cart: &mut Cart,
    payment_mode: PaymentMode,
    clock: &dyn Clock,
) -> Result<CheckoutReceipt> {
    debug!(student_id, %payment_mode, lines = cart.len(), "checkout");

    let mut conn = db.lock()?;
    let reconciliation = reconcile_with(&conn, cart, clock.today())?;
    if cart.is_empty() {
        return Err(CanteenError::EmptyCart);
    }

    let total = reconciliation.total;
    let (order_id, wallet_balance) =
        match place_order(&mut conn, student_id, cart, total, payment_mode, clock) {
            Ok(placed) => placed,
            Err(e) => {
                warn!(student_id, %payment_mode, %total, error = %e, "checkout aborted");
                return Err(e);
            }
        };

    cart.clear();
    info!(order_id, student_id, %payment_mode, %total, "order placed");

    Ok(CheckoutReceipt {
        order_id,
        total,
        payment_mode,
        payment_status: payment_mode.settlement_status(),
        wallet_balance,
        notices: reconciliation.notices,
    })
}

/// The all-or-nothing part of checkout. The transaction takes the write lock
/// up front so the balance read and the debit cannot interleave with another
/// checkout.
fn place_order(
    conn: &mut Connection,
    student_id: &str,
    cart: &Cart,
    total: Money,
    payment_mode: PaymentMode,
    clock: &dyn Clock,
) -> Result<(i64, Option<Money>)> {
    let failed = CanteenError::TransactionFailed;
    let today = clock.today();

    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(failed)?;

    let balance = store::get_wallet_balance(&tx, student_id)
        .map_err(failed)?
        .unwrap_or(Money::ZERO);

    let mut wallet_balance = None;
    if payment_mode == PaymentMode::Wallet {
        if balance < total {
            return Err(CanteenError::InsufficientBalance {
                needed: total,
                available: balance,
            });
        }

        let debited = balance - total;
        if !store::set_wallet_balance(&tx, student_id, debited, balance).map_err(failed)? {
            return Err(failed(rusqlite::Error::StatementChangedRows(0)));
        }
        wallet_balance = Some(debited);
    }

    let order_id = store::insert_order(
        &tx,
        student_id,
        today,
        clock.time_of_day(),
        total,
        OrderStatus::Pending,
    )
    .map_err(failed)?;

    store::insert_payment(
        &tx,
        order_id,
        payment_mode,
        total,
        payment_mode.settlement_status(),
        today,
    )
    .map_err(failed)?;

    // Subtotals are the cart's snapshot, not a fresh catalog lookup
    for line in cart.lines() {
        store::insert_order_item(&tx, order_id, line.item_id, line.quantity, line.line_total)
            .map_err(failed)?;
    }

    tx.commit().map_err(failed)?;
    Ok((order_id, wallet_balance))
}
