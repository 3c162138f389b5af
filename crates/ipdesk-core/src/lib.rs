//! Core types, lifecycle rules, and store traits for ipdesk.
//!
//! No HTTP or SQL lives here. Status derivation, filing transitions and
//! tracker merging are pure functions; storage backends run them inside
//! their own transactions, and [`service`] wires them to a clock and an
//! activity observer.

pub mod clock;
pub mod derive;
pub mod error;
pub mod filing;
pub mod lifecycle;
pub mod observer;
pub mod service;
pub mod status;
pub mod store;
pub mod tracker;

pub use error::{Error, Result};

/// Numeric identity of an application user.
pub type UserId = i64;
