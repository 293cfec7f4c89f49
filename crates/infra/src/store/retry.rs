//! Transaction retry wrapper.
//!
//! [`run_in_transaction`] runs a unit of work inside one store transaction.
//! Transient conflicts (serialization failures, deadlocks) are retried in a
//! fresh transaction with linear backoff; uniqueness violations and every
//! other failure are returned on the spot. Each attempt either commits as a
//! whole or is rolled back, so a retried operation is applied exactly once.

use std::fmt::Display;
use std::time::Duration;

use futures_util::future::BoxFuture;

use super::error::{ErrorClass, StoreError, classify};
use super::{Database, Transaction};

/// Retry bound and backoff for [`run_in_transaction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_retries: u32,
    /// Delay before retry `n` is `base_delay * n`.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Linear backoff after the given (1-based) failed attempt.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }

    fn attempts(&self) -> u32 {
        self.max_retries.max(1)
    }
}

/// Errors that may carry a store failure worth classifying.
///
/// Operations usually fail with an application error type that wraps
/// [`StoreError`] among other things; the wrapper only needs to see the
/// store part to decide whether to retry.
pub trait Retryable {
    fn store_error(&self) -> Option<&StoreError>;
}

impl Retryable for StoreError {
    fn store_error(&self) -> Option<&StoreError> {
        Some(self)
    }
}

fn class_of<E: Retryable>(error: &E) -> ErrorClass {
    error.store_error().map(classify).unwrap_or(ErrorClass::Other)
}

/// Run `op` inside a transaction, retrying transient conflicts.
///
/// With `existing = Some(tx)` the operation runs directly inside the caller's
/// transaction, once, with no retry: the caller owns the boundary and the
/// commit. Otherwise every attempt opens its own transaction; failures at
/// `begin` and `commit` are classified like failures inside `op`.
///
/// Once `policy.max_retries` attempts have all hit transient conflicts the
/// result is [`StoreError::RetriesExhausted`], converted into `E`.
pub async fn run_in_transaction<T, E, F>(
    db: &dyn Database,
    existing: Option<&mut dyn Transaction>,
    policy: &RetryPolicy,
    mut op: F,
) -> Result<T, E>
where
    F: for<'t> FnMut(&'t mut dyn Transaction) -> BoxFuture<'t, Result<T, E>> + Send,
    E: Retryable + From<StoreError> + Display + Send,
    T: Send,
{
    if let Some(tx) = existing {
        return op(tx).await;
    }

    let max = policy.attempts();
    let mut attempt = 0;
    loop {
        attempt += 1;
        let err = match attempt_once(db, &mut op).await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if class_of(&err) != ErrorClass::Transient {
            return Err(err);
        }
        if attempt >= max {
            tracing::error!(attempts = attempt, error = %err, "transaction retries exhausted");
            return Err(StoreError::RetriesExhausted {
                attempts: attempt,
                last: err.to_string(),
            }
            .into());
        }

        let delay = policy.delay_for_attempt(attempt);
        tracing::warn!(
            attempt,
            max_retries = max,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "transient store conflict, retrying transaction"
        );
        tokio::time::sleep(delay).await;
    }
}

async fn attempt_once<T, E, F>(db: &dyn Database, op: &mut F) -> Result<T, E>
where
    F: for<'t> FnMut(&'t mut dyn Transaction) -> BoxFuture<'t, Result<T, E>> + Send,
    E: From<StoreError> + Display + Send,
    T: Send,
{
    let mut tx = db.begin().await.map_err(E::from)?;
    match op(&mut *tx).await {
        Ok(value) => {
            tx.commit().await.map_err(E::from)?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rb) = tx.rollback().await {
                tracing::debug!(error = %rb, "rollback after failed attempt also failed");
            }
            Err(err)
        }
    }
}
