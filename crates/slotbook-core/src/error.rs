//! Error types for `slotbook-core`.

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

/// Every way a booking-engine operation can fail.
///
/// The set is closed: callers match on it exhaustively instead of inspecting
/// messages. Use [`BookingError::category`] to tell caller mistakes from
/// contention between racing callers and from infrastructure trouble.
#[derive(Debug, Error)]
pub enum BookingError {
  #[error("invalid request: {0}")]
  InvalidRequest(String),

  #[error("slot not found: {0}")]
  SlotNotFound(Uuid),

  #[error("slot {slot_id} starts at {start} and can no longer be booked")]
  SlotExpired { slot_id: Uuid, start: DateTime<Utc> },

  #[error("slot {0} is already booked")]
  AlreadyBooked(Uuid),

  #[error("reservation not found: {0}")]
  ReservationNotFound(Uuid),

  #[error("reservation {0} is already cancelled")]
  AlreadyCancelled(Uuid),

  #[error("storage unavailable: {0}")]
  StorageUnavailable(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Coarse classification of a [`BookingError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
  /// Deterministic rejection of the request as given; do not retry.
  Caller,
  /// Lost a race with another caller; refresh state and decide again.
  Contention,
  /// Transient storage failure; the identical request may be retried.
  Infrastructure,
}

impl BookingError {
  pub fn category(&self) -> ErrorCategory {
    match self {
      Self::InvalidRequest(_)
      | Self::SlotNotFound(_)
      | Self::SlotExpired { .. }
      | Self::ReservationNotFound(_) => ErrorCategory::Caller,
      Self::AlreadyBooked(_) | Self::AlreadyCancelled(_) => ErrorCategory::Contention,
      Self::StorageUnavailable(_) => ErrorCategory::Infrastructure,
    }
  }

  /// Repeating the identical request can only help for storage failures.
  /// A retry after an unseen commit observes `AlreadyBooked` or
  /// `AlreadyCancelled`, never a second booking.
  pub fn is_retryable(&self) -> bool { self.category() == ErrorCategory::Infrastructure }

  pub(crate) fn storage<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::StorageUnavailable(Box::new(err))
  }
}

pub type Result<T, E = BookingError> = std::result::Result<T, E>;
