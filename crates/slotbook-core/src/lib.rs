//! Core types and trait definitions for the slotbook booking service.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! [`SlotStore`](store::SlotStore) trait is implemented by storage backends
//! (e.g. `slotbook-store-sqlite`); the [`BookingEngine`](engine::BookingEngine)
//! runs the booking and cancellation protocol on top of it.

pub mod engine;
pub mod error;
pub mod reservation;
pub mod slot;
pub mod store;

pub use engine::BookingEngine;
pub use error::{BookingError, ErrorCategory, Result};
