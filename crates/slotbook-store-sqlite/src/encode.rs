//! Encoding and decoding helpers between domain types and the values stored
//! in SQLite columns.
//!
//! Timestamps are stored as integer microseconds since the Unix epoch, so SQL
//! ordering matches chronological order for every representable year. UUIDs
//! are stored as hyphenated lowercase strings.

use chrono::{DateTime, Utc};
use slotbook_core::{
  reservation::{Reservation, ReservationStatus},
  slot::{Requester, SlotState, TimeSlot},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

/// Sub-microsecond digits are dropped; callers truncate first with
/// [`slotbook_core::slot::truncate_micros`] so returned records match.
pub fn encode_dt(dt: DateTime<Utc>) -> i64 { dt.timestamp_micros() }

pub fn decode_dt(micros: i64) -> Result<DateTime<Utc>> {
  DateTime::from_timestamp_micros(micros)
    .ok_or_else(|| Error::DateParse(format!("{micros} µs is out of range")))
}

// ─── ReservationStatus ────────────────────────────────────────────────────────

pub const STATUS_ACTIVE: &str = "active";
pub const STATUS_CANCELLED: &str = "cancelled";

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawSlot::from_row`].
pub const SLOT_COLUMNS: &str = "slot_id, resource_id, start_at, end_at, created_at, \
                                booked, holder_name, holder_contact, reservation_id";

/// Raw values read directly from a `time_slots` row.
pub struct RawSlot {
  pub slot_id:        String,
  pub resource_id:    String,
  pub start_at:       i64,
  pub end_at:         i64,
  pub created_at:     i64,
  pub booked:         bool,
  pub holder_name:    Option<String>,
  pub holder_contact: Option<String>,
  pub reservation_id: Option<String>,
}

impl RawSlot {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      slot_id:        row.get(0)?,
      resource_id:    row.get(1)?,
      start_at:       row.get(2)?,
      end_at:         row.get(3)?,
      created_at:     row.get(4)?,
      booked:         row.get(5)?,
      holder_name:    row.get(6)?,
      holder_contact: row.get(7)?,
      reservation_id: row.get(8)?,
    })
  }

  pub fn into_slot(self) -> Result<TimeSlot> {
    let state = match (
      self.booked,
      self.holder_name,
      self.holder_contact,
      self.reservation_id,
    ) {
      (false, None, None, None) => SlotState::Free,
      (true, Some(name), Some(contact), Some(reservation_id)) => SlotState::Booked {
        holder:         Requester { name, contact },
        reservation_id: decode_uuid(&reservation_id)?,
      },
      _ => {
        return Err(Error::Inconsistent(format!(
          "slot {} has a booked flag that disagrees with its holder",
          self.slot_id
        )));
      }
    };

    Ok(TimeSlot {
      slot_id: decode_uuid(&self.slot_id)?,
      resource_id: decode_uuid(&self.resource_id)?,
      start: decode_dt(self.start_at)?,
      end: decode_dt(self.end_at)?,
      created_at: decode_dt(self.created_at)?,
      state,
    })
  }
}

/// Column list matching [`RawReservation::from_row`].
pub const RESERVATION_COLUMNS: &str = "reservation_id, slot_id, requester_name, \
                                       requester_contact, created_at, status, cancelled_at";

/// Raw values read directly from a `reservations` row.
pub struct RawReservation {
  pub reservation_id:    String,
  pub slot_id:           String,
  pub requester_name:    String,
  pub requester_contact: String,
  pub created_at:        i64,
  pub status:            String,
  pub cancelled_at:      Option<i64>,
}

impl RawReservation {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      reservation_id:    row.get(0)?,
      slot_id:           row.get(1)?,
      requester_name:    row.get(2)?,
      requester_contact: row.get(3)?,
      created_at:        row.get(4)?,
      status:            row.get(5)?,
      cancelled_at:      row.get(6)?,
    })
  }

  pub fn is_active(&self) -> bool { self.status == STATUS_ACTIVE }

  pub fn into_reservation(self) -> Result<Reservation> {
    let status = match (self.status.as_str(), self.cancelled_at) {
      (STATUS_ACTIVE, None) => ReservationStatus::Active,
      (STATUS_CANCELLED, Some(at)) => ReservationStatus::Cancelled { at: decode_dt(at)? },
      (STATUS_CANCELLED, None) | (STATUS_ACTIVE, Some(_)) => {
        return Err(Error::Inconsistent(format!(
          "reservation {} has status {:?} but cancelled_at {:?}",
          self.reservation_id, self.status, self.cancelled_at
        )));
      }
      (other, _) => return Err(Error::UnknownStatus(other.to_owned())),
    };

    Ok(Reservation {
      reservation_id: decode_uuid(&self.reservation_id)?,
      slot_id: decode_uuid(&self.slot_id)?,
      requester: Requester {
        name:    self.requester_name,
        contact: self.requester_contact,
      },
      created_at: decode_dt(self.created_at)?,
      status,
    })
  }
}
