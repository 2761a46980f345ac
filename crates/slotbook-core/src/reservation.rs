//! Reservations — the durable record of a successful booking.
//!
//! A reservation is created exactly when a booking succeeds and is never
//! deleted. Cancellation flips its status; a cancelled reservation stays
//! behind as an audit record and is never re-activated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::slot::Requester;

/// The lifecycle status of a reservation. `Cancelled` is terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReservationStatus {
  Active,
  Cancelled { at: DateTime<Utc> },
}

impl ReservationStatus {
  pub fn is_active(&self) -> bool { matches!(self, Self::Active) }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
  pub reservation_id: Uuid,
  pub slot_id:        Uuid,
  pub requester:      Requester,
  pub created_at:     DateTime<Utc>,
  pub status:         ReservationStatus,
}
