//! JSON REST API for slotbook.
//!
//! Exposes an axum [`Router`] backed by a [`BookingEngine`] over any
//! [`SlotStore`]. Auth, TLS, and transport concerns are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", slotbook_api::api_router(Arc::new(BookingEngine::new(store))))
//! ```

pub mod error;
pub mod reservations;
pub mod slots;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use slotbook_core::{BookingEngine, store::SlotStore};

pub use error::ApiError;

/// Build a fully-materialised API router for `engine`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(engine: Arc<BookingEngine<S>>) -> Router<()>
where
  S: SlotStore + 'static,
{
  Router::new()
    .route("/health", get(health))
    // Slots
    .route("/slots", get(slots::list_available::<S>).post(slots::create::<S>))
    .route("/slots/{id}", get(slots::get_one::<S>))
    .route("/slots/{id}/book", post(slots::book::<S>))
    .route("/slots/{id}/reservations", get(slots::reservations::<S>))
    // Reservations
    .route("/reservations/{id}", get(reservations::get_one::<S>))
    .route("/reservations/{id}/cancel", post(reservations::cancel::<S>))
    .with_state(engine)
}

async fn health() -> &'static str { "ok" }
