//! Handlers for `/reservations` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/reservations/:id` | Any status |
//! | `POST` | `/reservations/:id/cancel` | 409 if already cancelled |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use slotbook_core::{BookingEngine, reservation::Reservation, store::SlotStore};
use uuid::Uuid;

use crate::error::ApiError;

/// `GET /reservations/:id`
pub async fn get_one<S: SlotStore>(
  State(engine): State<Arc<BookingEngine<S>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Reservation>, ApiError> {
  Ok(Json(engine.get_reservation(id).await?))
}

/// `POST /reservations/:id/cancel` — returns the reservation in its
/// cancelled state.
pub async fn cancel<S: SlotStore>(
  State(engine): State<Arc<BookingEngine<S>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Reservation>, ApiError> {
  Ok(Json(engine.cancel_booking(id).await?))
}
