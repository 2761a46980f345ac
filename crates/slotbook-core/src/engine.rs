//! [`BookingEngine`] — the booking and cancellation protocol.
//!
//! The engine validates what it can without touching storage, then hands the
//! state transition to the store's atomic operations and translates their
//! outcome into a [`BookingError`] or a result. It holds no locks of its own:
//! when two callers race on one slot, the store's transaction isolation picks
//! the single winner.

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
  error::{BookingError, Result},
  reservation::Reservation,
  slot::{NewSlot, Requester, TimeSlot},
  store::{BookOutcome, CancelOutcome, SlotQuery, SlotStore},
};

/// Booking protocol over an injected [`SlotStore`].
///
/// The store is opened by the caller and handed over at construction; get it
/// back with [`BookingEngine::into_store`] to close it at shutdown.
#[derive(Debug, Clone)]
pub struct BookingEngine<S> {
  store: S,
}

impl<S: SlotStore> BookingEngine<S> {
  pub fn new(store: S) -> Self { Self { store } }

  pub fn store(&self) -> &S { &self.store }

  pub fn into_store(self) -> S { self.store }

  // ── Slots ─────────────────────────────────────────────────────────────

  /// Record a new free slot. The window must be non-empty and lie in the
  /// future relative to `now`, both checked after truncating the bounds to
  /// whole microseconds.
  pub async fn create_slot(&self, input: NewSlot, now: DateTime<Utc>) -> Result<TimeSlot> {
    let input = input.truncated();
    if input.start >= input.end {
      return Err(BookingError::InvalidRequest(
        "slot start must be before its end".into(),
      ));
    }
    if input.start <= now {
      return Err(BookingError::InvalidRequest(
        "cannot create a slot that has already started".into(),
      ));
    }

    let slot = self.store.add_slot(input).await.map_err(storage_failure)?;
    info!(slot_id = %slot.slot_id, resource_id = %slot.resource_id, "slot created");
    Ok(slot)
  }

  pub async fn get_slot(&self, slot_id: Uuid) -> Result<TimeSlot> {
    self
      .store
      .get_slot(slot_id)
      .await
      .map_err(storage_failure)?
      .ok_or(BookingError::SlotNotFound(slot_id))
  }

  /// Free slots on the UTC day `date`, earliest first, optionally for one
  /// resource only.
  pub async fn list_available_slots(
    &self,
    resource_id: Option<Uuid>,
    date: NaiveDate,
  ) -> Result<Vec<TimeSlot>> {
    let query = SlotQuery::for_date(resource_id, date);
    self
      .store
      .list_available_slots(&query)
      .await
      .map_err(storage_failure)
  }

  // ── Booking protocol ──────────────────────────────────────────────────

  /// Book `slot_id` for `requester`.
  ///
  /// Of any number of concurrent calls for the same free slot exactly one
  /// returns the new reservation; the rest get
  /// [`BookingError::AlreadyBooked`].
  pub async fn book_slot(
    &self,
    slot_id: Uuid,
    requester: Requester,
    requested_at: DateTime<Utc>,
  ) -> Result<Reservation> {
    if !requester.is_complete() {
      debug!(%slot_id, "rejecting booking with incomplete requester");
      return Err(BookingError::InvalidRequest(
        "requester name and contact are required".into(),
      ));
    }

    let slot = self.get_slot(slot_id).await?;

    if slot.has_started(requested_at) {
      debug!(%slot_id, start = %slot.start, %requested_at, "rejecting booking of started slot");
      return Err(BookingError::SlotExpired { slot_id, start: slot.start });
    }

    match self
      .store
      .atomic_book(slot_id, requester)
      .await
      .map_err(storage_failure)?
    {
      BookOutcome::Booked(reservation) => {
        info!(
          %slot_id,
          reservation_id = %reservation.reservation_id,
          "slot booked"
        );
        Ok(reservation)
      }
      BookOutcome::Conflict => {
        debug!(%slot_id, "slot already booked");
        Err(BookingError::AlreadyBooked(slot_id))
      }
      BookOutcome::SlotNotFound => Err(BookingError::SlotNotFound(slot_id)),
    }
  }

  /// Cancel an active reservation and release its slot. Returns the
  /// reservation in its cancelled state.
  pub async fn cancel_booking(&self, reservation_id: Uuid) -> Result<Reservation> {
    match self
      .store
      .atomic_cancel(reservation_id)
      .await
      .map_err(storage_failure)?
    {
      CancelOutcome::Cancelled(reservation) => {
        info!(
          %reservation_id,
          slot_id = %reservation.slot_id,
          "reservation cancelled"
        );
        Ok(reservation)
      }
      CancelOutcome::NotFound => Err(BookingError::ReservationNotFound(reservation_id)),
      CancelOutcome::AlreadyCancelled => {
        debug!(%reservation_id, "reservation already cancelled");
        Err(BookingError::AlreadyCancelled(reservation_id))
      }
    }
  }

  // ── Reservations ──────────────────────────────────────────────────────

  pub async fn get_reservation(&self, reservation_id: Uuid) -> Result<Reservation> {
    self
      .store
      .get_reservation(reservation_id)
      .await
      .map_err(storage_failure)?
      .ok_or(BookingError::ReservationNotFound(reservation_id))
  }

  /// The full booking history of a slot, cancelled reservations included.
  pub async fn list_reservations(&self, slot_id: Uuid) -> Result<Vec<Reservation>> {
    let slot = self.get_slot(slot_id).await?;
    self
      .store
      .list_reservations(slot.slot_id)
      .await
      .map_err(storage_failure)
  }
}

fn storage_failure<E>(err: E) -> BookingError
where
  E: std::error::Error + Send + Sync + 'static,
{
  warn!(error = %err, "slot store failure");
  BookingError::storage(err)
}
