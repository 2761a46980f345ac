//! Time slots — fixed windows that can be booked by at most one party.

use chrono::{DateTime, Timelike as _, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The identity of whoever books a slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requester {
  pub name:    String,
  /// Email address or other contact handle.
  pub contact: String,
}

impl Requester {
  pub fn new(name: impl Into<String>, contact: impl Into<String>) -> Self {
    Self { name: name.into(), contact: contact.into() }
  }

  /// Both fields must contain something other than whitespace.
  pub fn is_complete(&self) -> bool {
    !self.name.trim().is_empty() && !self.contact.trim().is_empty()
  }
}

/// Whether a slot is free, and if not, who holds it.
///
/// The holder and the occupying reservation only exist together with the
/// booked state, so a booked slot without a holder cannot be represented.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SlotState {
  Free,
  Booked {
    holder:         Requester,
    /// The active reservation currently occupying the slot.
    reservation_id: Uuid,
  },
}

/// Drop sub-microsecond digits. Instants are kept at microsecond precision
/// everywhere, so a record handed back to a caller matches the stored one.
pub fn truncate_micros(dt: DateTime<Utc>) -> DateTime<Utc> {
  let nanos = dt.nanosecond();
  dt.with_nanosecond(nanos - nanos % 1_000).unwrap_or(dt)
}

/// A window of time owned by a resource (e.g. an interviewer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
  pub slot_id:     Uuid,
  pub resource_id: Uuid,
  pub start:       DateTime<Utc>,
  pub end:         DateTime<Utc>,
  pub created_at:  DateTime<Utc>,
  pub state:       SlotState,
}

impl TimeSlot {
  pub fn is_booked(&self) -> bool { matches!(self.state, SlotState::Booked { .. }) }

  pub fn holder(&self) -> Option<&Requester> {
    match &self.state {
      SlotState::Free => None,
      SlotState::Booked { holder, .. } => Some(holder),
    }
  }

  /// `true` once the slot has started (or passed) relative to `now`.
  pub fn has_started(&self, now: DateTime<Utc>) -> bool { self.start <= now }
}

/// Input for creating a new, free slot. The store assigns the id and
/// `created_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSlot {
  pub resource_id: Uuid,
  pub start:       DateTime<Utc>,
  pub end:         DateTime<Utc>,
}

impl NewSlot {
  /// The same window with both bounds truncated to whole microseconds.
  pub fn truncated(self) -> Self {
    Self {
      resource_id: self.resource_id,
      start:       truncate_micros(self.start),
      end:         truncate_micros(self.end),
    }
  }
}
