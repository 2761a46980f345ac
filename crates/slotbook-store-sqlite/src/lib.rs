//! SQLite backend for the slotbook slot store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated
//! thread without blocking the async runtime. Booking and cancellation each
//! run in a single `BEGIN IMMEDIATE` transaction, so the write lock is held
//! from the moment a slot is read until both of its writes commit.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
