//! SQLite backend for ipdesk filings and trackers.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Each store method is one `call` and
//! one transaction.

mod encode;
mod schema;
mod store;
mod tracker;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
