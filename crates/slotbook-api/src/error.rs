//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use slotbook_core::BookingError;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error(transparent)]
  Booking(#[from] BookingError),
}

impl ApiError {
  /// Stable machine-readable tag for the `kind` field of the error body.
  fn kind(&self) -> &'static str {
    match self {
      ApiError::Booking(e) => match e {
        BookingError::InvalidRequest(_) => "invalid_request",
        BookingError::SlotNotFound(_) => "slot_not_found",
        BookingError::SlotExpired { .. } => "slot_expired",
        BookingError::AlreadyBooked(_) => "already_booked",
        BookingError::ReservationNotFound(_) => "reservation_not_found",
        BookingError::AlreadyCancelled(_) => "already_cancelled",
        BookingError::StorageUnavailable(_) => "storage_unavailable",
      },
    }
  }

  fn status(&self) -> StatusCode {
    match self {
      ApiError::Booking(e) => match e {
        BookingError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        BookingError::SlotExpired { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        BookingError::SlotNotFound(_) | BookingError::ReservationNotFound(_) => {
          StatusCode::NOT_FOUND
        }
        BookingError::AlreadyBooked(_) | BookingError::AlreadyCancelled(_) => {
          StatusCode::CONFLICT
        }
        BookingError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
      },
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    }
    (status, Json(json!({ "error": self.to_string(), "kind": self.kind() }))).into_response()
  }
}
