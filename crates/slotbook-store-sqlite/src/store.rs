//! [`SqliteStore`] — the SQLite implementation of [`SlotStore`].

use std::{path::Path, time::Duration};

use chrono::Utc;
use rusqlite::{OptionalExtension as _, TransactionBehavior};
use tracing::debug;
use uuid::Uuid;

use slotbook_core::{
  reservation::{Reservation, ReservationStatus},
  slot::{NewSlot, Requester, SlotState, TimeSlot, truncate_micros},
  store::{BookOutcome, CancelOutcome, SlotQuery, SlotStore},
};

use crate::{
  encode::{
    RESERVATION_COLUMNS, RawReservation, RawSlot, SLOT_COLUMNS, STATUS_ACTIVE, STATUS_CANCELLED,
    encode_dt, encode_uuid,
  },
  schema::SCHEMA,
  Result,
};

/// How long a transaction waits for another connection's write lock before
/// giving up with `SQLITE_BUSY`.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// What the booking transaction saw, decided inside the connection thread.
enum BookTx {
  Booked,
  Conflict,
  SlotNotFound,
}

/// What the cancellation transaction saw.
enum CancelTx {
  Cancelled { raw: RawReservation, released: bool },
  NotFound,
  AlreadyCancelled,
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A slot store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. Several
/// stores (or processes) may open the same file; `BEGIN IMMEDIATE` plus the
/// busy timeout serialise their writers.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl std::fmt::Debug for SqliteStore {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SqliteStore").finish_non_exhaustive()
  }
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Close the underlying connection, flushing any pending work. Other
  /// clones of this store stop working afterwards.
  pub async fn close(self) -> Result<()> {
    self.conn.close().await?;
    Ok(())
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── SlotStore impl ──────────────────────────────────────────────────────────

impl SlotStore for SqliteStore {
  type Error = crate::Error;

  // ── Slots ─────────────────────────────────────────────────────────────────

  async fn add_slot(&self, input: NewSlot) -> Result<TimeSlot> {
    let input = input.truncated();
    let slot = TimeSlot {
      slot_id:     Uuid::new_v4(),
      resource_id: input.resource_id,
      start:       input.start,
      end:         input.end,
      created_at:  truncate_micros(Utc::now()),
      state:       SlotState::Free,
    };

    let id_str       = encode_uuid(slot.slot_id);
    let resource_str = encode_uuid(slot.resource_id);
    let start_at     = encode_dt(slot.start);
    let end_at       = encode_dt(slot.end);
    let created_at   = encode_dt(slot.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO time_slots (slot_id, resource_id, start_at, end_at, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, resource_str, start_at, end_at, created_at],
        )?;
        Ok(())
      })
      .await?;

    Ok(slot)
  }

  async fn get_slot(&self, slot_id: Uuid) -> Result<Option<TimeSlot>> {
    let id_str = encode_uuid(slot_id);

    let raw: Option<RawSlot> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {SLOT_COLUMNS} FROM time_slots WHERE slot_id = ?1"),
            rusqlite::params![id_str],
            RawSlot::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawSlot::into_slot).transpose()
  }

  async fn list_available_slots(&self, query: &SlotQuery) -> Result<Vec<TimeSlot>> {
    let resource_str = query.resource_id.map(encode_uuid);
    let starts_from  = encode_dt(query.starts_from);
    let ends_by      = encode_dt(query.ends_by);

    let raws: Vec<RawSlot> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {SLOT_COLUMNS}
           FROM time_slots
           WHERE booked = 0
             AND start_at >= ?1
             AND end_at   <= ?2
             AND (?3 IS NULL OR resource_id = ?3)
           ORDER BY start_at ASC"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![starts_from, ends_by, resource_str],
            RawSlot::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSlot::into_slot).collect()
  }

  // ── Atomic transitions ────────────────────────────────────────────────────

  async fn atomic_book(&self, slot_id: Uuid, holder: Requester) -> Result<BookOutcome> {
    let reservation = Reservation {
      reservation_id: Uuid::new_v4(),
      slot_id,
      requester: holder,
      created_at: truncate_micros(Utc::now()),
      status: ReservationStatus::Active,
    };

    let slot_str        = encode_uuid(slot_id);
    let reservation_str = encode_uuid(reservation.reservation_id);
    let name            = reservation.requester.name.clone();
    let contact         = reservation.requester.contact.clone();
    let created_at      = encode_dt(reservation.created_at);

    let outcome = self
      .conn
      .call(move |conn| {
        // IMMEDIATE takes the write lock before the read below, so no other
        // writer can book the slot between our check and our update.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let booked: Option<bool> = tx
          .query_row(
            "SELECT booked FROM time_slots WHERE slot_id = ?1",
            rusqlite::params![slot_str],
            |row| row.get(0),
          )
          .optional()?;

        match booked {
          None => return Ok(BookTx::SlotNotFound),
          Some(true) => return Ok(BookTx::Conflict),
          Some(false) => {}
        }

        tx.execute(
          "INSERT INTO reservations (
             reservation_id, slot_id, requester_name, requester_contact,
             created_at, status
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![reservation_str, slot_str, name, contact, created_at, STATUS_ACTIVE],
        )?;

        let updated = tx.execute(
          "UPDATE time_slots
           SET booked = 1, holder_name = ?2, holder_contact = ?3, reservation_id = ?4
           WHERE slot_id = ?1 AND booked = 0",
          rusqlite::params![slot_str, name, contact, reservation_str],
        )?;
        if updated != 1 {
          // Dropping `tx` rolls back the reservation insert.
          return Ok(BookTx::Conflict);
        }

        tx.commit()?;
        Ok(BookTx::Booked)
      })
      .await?;

    Ok(match outcome {
      BookTx::Booked => {
        debug!(%slot_id, reservation_id = %reservation.reservation_id, "booking committed");
        BookOutcome::Booked(reservation)
      }
      BookTx::Conflict => {
        debug!(%slot_id, "booking rolled back: slot already booked");
        BookOutcome::Conflict
      }
      BookTx::SlotNotFound => BookOutcome::SlotNotFound,
    })
  }

  async fn atomic_cancel(&self, reservation_id: Uuid) -> Result<CancelOutcome> {
    let reservation_str = encode_uuid(reservation_id);
    let cancelled_at    = encode_dt(Utc::now());

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let raw: Option<RawReservation> = tx
          .query_row(
            &format!(
              "SELECT {RESERVATION_COLUMNS} FROM reservations WHERE reservation_id = ?1"
            ),
            rusqlite::params![reservation_str],
            RawReservation::from_row,
          )
          .optional()?;

        let Some(mut raw) = raw else {
          return Ok(CancelTx::NotFound);
        };
        if !raw.is_active() {
          return Ok(CancelTx::AlreadyCancelled);
        }

        tx.execute(
          "UPDATE reservations SET status = ?2, cancelled_at = ?3 WHERE reservation_id = ?1",
          rusqlite::params![reservation_str, STATUS_CANCELLED, cancelled_at],
        )?;

        // Only release the slot if this reservation still occupies it.
        let released = tx.execute(
          "UPDATE time_slots
           SET booked = 0, holder_name = NULL, holder_contact = NULL, reservation_id = NULL
           WHERE slot_id = ?1 AND reservation_id = ?2",
          rusqlite::params![raw.slot_id, reservation_str],
        )?;

        tx.commit()?;

        raw.status       = STATUS_CANCELLED.to_owned();
        raw.cancelled_at = Some(cancelled_at);
        Ok(CancelTx::Cancelled { raw, released: released == 1 })
      })
      .await?;

    Ok(match outcome {
      CancelTx::Cancelled { raw, released } => {
        debug!(%reservation_id, released, "cancellation committed");
        CancelOutcome::Cancelled(raw.into_reservation()?)
      }
      CancelTx::NotFound => CancelOutcome::NotFound,
      CancelTx::AlreadyCancelled => CancelOutcome::AlreadyCancelled,
    })
  }

  // ── Reservations ──────────────────────────────────────────────────────────

  async fn get_reservation(&self, reservation_id: Uuid) -> Result<Option<Reservation>> {
    let id_str = encode_uuid(reservation_id);

    let raw: Option<RawReservation> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "SELECT {RESERVATION_COLUMNS} FROM reservations WHERE reservation_id = ?1"
            ),
            rusqlite::params![id_str],
            RawReservation::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawReservation::into_reservation).transpose()
  }

  async fn list_reservations(&self, slot_id: Uuid) -> Result<Vec<Reservation>> {
    let slot_str = encode_uuid(slot_id);

    let raws: Vec<RawReservation> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {RESERVATION_COLUMNS}
           FROM reservations
           WHERE slot_id = ?1
           ORDER BY created_at ASC, rowid ASC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![slot_str], RawReservation::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawReservation::into_reservation).collect()
  }
}
