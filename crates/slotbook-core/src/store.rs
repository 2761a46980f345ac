//! The `SlotStore` trait and supporting query and outcome types.
//!
//! The trait is implemented by storage backends (e.g.
//! `slotbook-store-sqlite`). The [`BookingEngine`](crate::BookingEngine) and
//! everything above it depend on this abstraction, not on any concrete
//! backend.

use std::future::Future;

use chrono::{DateTime, Days, NaiveDate, Utc};
use uuid::Uuid;

use crate::{
  reservation::Reservation,
  slot::{NewSlot, Requester, TimeSlot},
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`SlotStore::list_available_slots`].
///
/// A slot matches when it starts at or after `starts_from` and ends at or
/// before `ends_by`.
#[derive(Debug, Clone)]
pub struct SlotQuery {
  /// Restrict to slots owned by one resource.
  pub resource_id: Option<Uuid>,
  pub starts_from: DateTime<Utc>,
  pub ends_by:     DateTime<Utc>,
}

impl SlotQuery {
  /// Slots that lie entirely within the UTC calendar day `date`.
  pub fn for_date(resource_id: Option<Uuid>, date: NaiveDate) -> Self {
    let starts_from = date.and_time(chrono::NaiveTime::MIN).and_utc();
    let ends_by = starts_from
      .checked_add_days(Days::new(1))
      .unwrap_or(DateTime::<Utc>::MAX_UTC);
    Self { resource_id, starts_from, ends_by }
  }
}

// ─── Outcomes ────────────────────────────────────────────────────────────────

/// Result of [`SlotStore::atomic_book`].
///
/// These are all normal outcomes; infrastructure failures travel in the
/// `Err` arm of the surrounding `Result` instead.
#[derive(Debug, Clone)]
pub enum BookOutcome {
  /// The slot was free; both writes are committed.
  Booked(Reservation),
  /// The slot was already booked when the transaction read it.
  Conflict,
  SlotNotFound,
}

/// Result of [`SlotStore::atomic_cancel`].
#[derive(Debug, Clone)]
pub enum CancelOutcome {
  /// The reservation is now cancelled; carries its updated record.
  Cancelled(Reservation),
  NotFound,
  AlreadyCancelled,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a slot store backend.
///
/// Every mutation is a single isolated transaction: concurrent readers never
/// observe a booked slot without its active reservation, or the reverse.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait SlotStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Slots ─────────────────────────────────────────────────────────────

  /// Persist a new free slot. Window validation is the caller's job.
  fn add_slot(
    &self,
    input: NewSlot,
  ) -> impl Future<Output = Result<TimeSlot, Self::Error>> + Send + '_;

  /// Retrieve a slot by UUID. Returns `None` if not found.
  fn get_slot(
    &self,
    slot_id: Uuid,
  ) -> impl Future<Output = Result<Option<TimeSlot>, Self::Error>> + Send + '_;

  /// Free slots matching `query`, ordered by start ascending.
  fn list_available_slots<'a>(
    &'a self,
    query: &'a SlotQuery,
  ) -> impl Future<Output = Result<Vec<TimeSlot>, Self::Error>> + Send + 'a;

  // ── Atomic transitions ────────────────────────────────────────────────

  /// Re-read the slot and, if it is free, mark it booked by `holder` and
  /// insert a new active reservation, all in one transaction.
  fn atomic_book(
    &self,
    slot_id: Uuid,
    holder: Requester,
  ) -> impl Future<Output = Result<BookOutcome, Self::Error>> + Send + '_;

  /// Mark an active reservation cancelled and, if its slot still points at
  /// it, free the slot, all in one transaction.
  fn atomic_cancel(
    &self,
    reservation_id: Uuid,
  ) -> impl Future<Output = Result<CancelOutcome, Self::Error>> + Send + '_;

  // ── Reservations ──────────────────────────────────────────────────────

  /// Retrieve a reservation by UUID, whatever its status.
  fn get_reservation(
    &self,
    reservation_id: Uuid,
  ) -> impl Future<Output = Result<Option<Reservation>, Self::Error>> + Send + '_;

  /// Every reservation ever made against `slot_id`, oldest first.
  fn list_reservations(
    &self,
    slot_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Reservation>, Self::Error>> + Send + '_;
}
