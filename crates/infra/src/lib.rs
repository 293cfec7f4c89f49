//! `teatrade-infra`: configuration and storage.
//!
//! The [`store`] module hides the database behind a transaction API and owns
//! the retry policy for transient conflicts; [`config`] loads [`Settings`].

pub mod config;
pub mod store;

pub use config::Settings;
pub use store::{
    Database, ErrorClass, FaultPoint, Filter, InMemoryDatabase, PostgresDatabase, RawRecord,
    RetryPolicy, Retryable, StoreError, Transaction, classify, connect, run_in_transaction,
};
