//! Handlers for `/slots` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/slots` | `?date=YYYY-MM-DD` required; optional `resource_id` |
//! | `POST` | `/slots` | Body: [`CreateSlotBody`]; returns 201 + stored slot |
//! | `GET`  | `/slots/:id` | 404 if not found |
//! | `POST` | `/slots/:id/book` | Body: [`BookBody`]; returns 201 + reservation |
//! | `GET`  | `/slots/:id/reservations` | Full history, cancelled included |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use slotbook_core::{
  BookingEngine,
  reservation::Reservation,
  slot::{NewSlot, Requester, TimeSlot},
  store::SlotStore,
};
use uuid::Uuid;

use crate::error::ApiError;

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  /// The UTC calendar day to list.
  pub date:        NaiveDate,
  pub resource_id: Option<Uuid>,
}

/// `GET /slots?date=<date>[&resource_id=<id>]`
pub async fn list_available<S: SlotStore>(
  State(engine): State<Arc<BookingEngine<S>>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<TimeSlot>>, ApiError> {
  let slots = engine
    .list_available_slots(params.resource_id, params.date)
    .await?;
  Ok(Json(slots))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateSlotBody {
  pub resource_id: Uuid,
  pub start:       DateTime<Utc>,
  pub end:         DateTime<Utc>,
}

/// `POST /slots` — returns 201 + the stored [`TimeSlot`].
pub async fn create<S: SlotStore>(
  State(engine): State<Arc<BookingEngine<S>>>,
  Json(body): Json<CreateSlotBody>,
) -> Result<impl IntoResponse, ApiError> {
  let input = NewSlot {
    resource_id: body.resource_id,
    start:       body.start,
    end:         body.end,
  };
  let slot = engine.create_slot(input, Utc::now()).await?;
  Ok((StatusCode::CREATED, Json(slot)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /slots/:id`
pub async fn get_one<S: SlotStore>(
  State(engine): State<Arc<BookingEngine<S>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<TimeSlot>, ApiError> {
  Ok(Json(engine.get_slot(id).await?))
}

// ─── Book ─────────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /slots/:id/book`.
#[derive(Debug, Deserialize)]
pub struct BookBody {
  pub name:    String,
  pub contact: String,
}

/// `POST /slots/:id/book` — books against the server clock and returns
/// 201 + the new [`Reservation`], or 409 if someone got there first.
pub async fn book<S: SlotStore>(
  State(engine): State<Arc<BookingEngine<S>>>,
  Path(id): Path<Uuid>,
  Json(body): Json<BookBody>,
) -> Result<impl IntoResponse, ApiError> {
  let requester = Requester::new(body.name, body.contact);
  let reservation = engine.book_slot(id, requester, Utc::now()).await?;
  Ok((StatusCode::CREATED, Json(reservation)))
}

// ─── History ──────────────────────────────────────────────────────────────────

/// `GET /slots/:id/reservations`
pub async fn reservations<S: SlotStore>(
  State(engine): State<Arc<BookingEngine<S>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Reservation>>, ApiError> {
  Ok(Json(engine.list_reservations(id).await?))
}
