//! Integration tests for `SqliteStore` against in-memory and file databases.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use slotbook_core::{
  reservation::ReservationStatus,
  slot::{NewSlot, Requester, SlotState, TimeSlot},
  store::{BookOutcome, CancelOutcome, SlotQuery, SlotStore},
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn at(h: u32, m: u32) -> DateTime<Utc> { Utc.with_ymd_and_hms(2030, 5, 6, h, m, 0).unwrap() }

async fn add_slot(s: &SqliteStore, resource_id: Uuid, start: DateTime<Utc>) -> TimeSlot {
  s.add_slot(NewSlot { resource_id, start, end: start + Duration::minutes(30) })
    .await
    .unwrap()
}

fn ana() -> Requester { Requester::new("Ana", "ana@x.com") }

fn bo() -> Requester { Requester::new("Bo", "bo@x.com") }

fn booked(outcome: BookOutcome) -> slotbook_core::reservation::Reservation {
  match outcome {
    BookOutcome::Booked(r) => r,
    other => panic!("expected a booking, got {other:?}"),
  }
}

// ─── Slots ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_and_get_slot() {
  let s = store().await;
  let resource_id = Uuid::new_v4();
  let slot = add_slot(&s, resource_id, at(9, 0)).await;

  let fetched = s.get_slot(slot.slot_id).await.unwrap().unwrap();
  assert_eq!(fetched.slot_id, slot.slot_id);
  assert_eq!(fetched.resource_id, resource_id);
  assert_eq!(fetched.start, at(9, 0));
  assert_eq!(fetched.end, at(9, 30));
  assert_eq!(fetched.state, SlotState::Free);
}

#[tokio::test]
async fn returned_slot_matches_stored_slot() {
  let s = store().await;
  let start = at(9, 0) + Duration::nanoseconds(1_234_567);
  let slot = s
    .add_slot(NewSlot { resource_id: Uuid::new_v4(), start, end: start + Duration::minutes(30) })
    .await
    .unwrap();

  assert_eq!(slot.start, at(9, 0) + Duration::microseconds(1_234));
  assert_eq!(s.get_slot(slot.slot_id).await.unwrap(), Some(slot));
}

#[tokio::test]
async fn five_digit_year_slot_is_readable_and_bookable() {
  let s = store().await;
  let start = Utc.with_ymd_and_hms(10000, 1, 1, 9, 0, 0).unwrap();
  let slot = add_slot(&s, Uuid::new_v4(), start).await;

  let fetched = s.get_slot(slot.slot_id).await.unwrap().unwrap();
  assert_eq!(fetched.start, start);
  let r = booked(s.atomic_book(slot.slot_id, ana()).await.unwrap());
  assert_eq!(s.list_reservations(slot.slot_id).await.unwrap(), vec![r]);
}

#[tokio::test]
async fn get_slot_missing_returns_none() {
  let s = store().await;
  assert!(s.get_slot(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn inverted_window_is_rejected_by_schema() {
  let s = store().await;
  let result = s
    .add_slot(NewSlot { resource_id: Uuid::new_v4(), start: at(10, 0), end: at(9, 0) })
    .await;
  assert!(matches!(result, Err(crate::Error::Database(_))));
}

#[tokio::test]
async fn list_available_filters_and_orders() {
  let s = store().await;
  let alice = Uuid::new_v4();
  let bob = Uuid::new_v4();

  let late = add_slot(&s, alice, at(15, 0)).await;
  let early = add_slot(&s, alice, at(9, 0)).await;
  let bobs = add_slot(&s, bob, at(11, 0)).await;
  let taken = add_slot(&s, alice, at(12, 0)).await;
  // Spans midnight, so it is not entirely within the day.
  add_slot(&s, alice, at(23, 45)).await;
  booked(s.atomic_book(taken.slot_id, ana()).await.unwrap());

  let day = at(0, 0).date_naive();
  let all = s.list_available_slots(&SlotQuery::for_date(None, day)).await.unwrap();
  let ids: Vec<_> = all.iter().map(|s| s.slot_id).collect();
  assert_eq!(ids, vec![early.slot_id, bobs.slot_id, late.slot_id]);

  let alices = s
    .list_available_slots(&SlotQuery::for_date(Some(alice), day))
    .await
    .unwrap();
  let ids: Vec<_> = alices.iter().map(|s| s.slot_id).collect();
  assert_eq!(ids, vec![early.slot_id, late.slot_id]);
}

// ─── Booking ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn book_sets_flag_and_inserts_reservation_together() {
  let s = store().await;
  let slot = add_slot(&s, Uuid::new_v4(), at(9, 0)).await;

  let r = booked(s.atomic_book(slot.slot_id, ana()).await.unwrap());
  assert_eq!(r.slot_id, slot.slot_id);
  assert!(r.status.is_active());

  let fetched = s.get_slot(slot.slot_id).await.unwrap().unwrap();
  assert_eq!(
    fetched.state,
    SlotState::Booked { holder: ana(), reservation_id: r.reservation_id }
  );

  let stored = s.get_reservation(r.reservation_id).await.unwrap().unwrap();
  assert_eq!(stored.slot_id, slot.slot_id);
  assert_eq!(stored.requester, ana());
  assert_eq!(stored.status, ReservationStatus::Active);
}

#[tokio::test]
async fn returned_reservations_match_stored_records() {
  let s = store().await;
  let slot = add_slot(&s, Uuid::new_v4(), at(9, 0)).await;

  let r = booked(s.atomic_book(slot.slot_id, ana()).await.unwrap());
  assert_eq!(s.get_reservation(r.reservation_id).await.unwrap(), Some(r.clone()));

  let cancelled = match s.atomic_cancel(r.reservation_id).await.unwrap() {
    CancelOutcome::Cancelled(r) => r,
    other => panic!("expected cancellation, got {other:?}"),
  };
  assert_eq!(s.get_reservation(r.reservation_id).await.unwrap(), Some(cancelled));
}

#[tokio::test]
async fn second_book_conflicts() {
  let s = store().await;
  let slot = add_slot(&s, Uuid::new_v4(), at(9, 0)).await;

  let first = booked(s.atomic_book(slot.slot_id, ana()).await.unwrap());
  let second = s.atomic_book(slot.slot_id, bo()).await.unwrap();
  assert!(matches!(second, BookOutcome::Conflict));

  // The loser left nothing behind.
  let history = s.list_reservations(slot.slot_id).await.unwrap();
  assert_eq!(history.len(), 1);
  assert_eq!(history[0].reservation_id, first.reservation_id);
  let fetched = s.get_slot(slot.slot_id).await.unwrap().unwrap();
  assert_eq!(fetched.holder(), Some(&ana()));
}

#[tokio::test]
async fn book_missing_slot() {
  let s = store().await;
  let outcome = s.atomic_book(Uuid::new_v4(), ana()).await.unwrap();
  assert!(matches!(outcome, BookOutcome::SlotNotFound));
}

#[tokio::test]
async fn failed_write_rolls_back_both_halves() {
  let s = store().await;
  let slot = add_slot(&s, Uuid::new_v4(), at(9, 0)).await;

  // Abort the slot update, which runs after the reservation insert.
  s.conn
    .call(|conn| {
      conn.execute_batch(
        "CREATE TRIGGER crash_on_book BEFORE UPDATE OF booked ON time_slots
         WHEN NEW.booked = 1
         BEGIN SELECT RAISE(ABORT, 'simulated crash'); END;",
      )?;
      Ok(())
    })
    .await
    .unwrap();

  let result = s.atomic_book(slot.slot_id, ana()).await;
  assert!(matches!(result, Err(crate::Error::Database(_))));

  assert!(!s.get_slot(slot.slot_id).await.unwrap().unwrap().is_booked());
  assert!(s.list_reservations(slot.slot_id).await.unwrap().is_empty());

  s.conn
    .call(|conn| {
      conn.execute_batch("DROP TRIGGER crash_on_book;")?;
      Ok(())
    })
    .await
    .unwrap();
  booked(s.atomic_book(slot.slot_id, ana()).await.unwrap());
}

#[tokio::test]
async fn schema_allows_one_active_reservation_per_slot() {
  let s = store().await;
  let slot = add_slot(&s, Uuid::new_v4(), at(9, 0)).await;
  booked(s.atomic_book(slot.slot_id, ana()).await.unwrap());

  let slot_str = slot.slot_id.to_string();
  let result = s
    .conn
    .call(move |conn| {
      conn.execute(
        "INSERT INTO reservations (
           reservation_id, slot_id, requester_name, requester_contact, created_at
         ) VALUES (?1, ?2, 'Mallory', 'm@x.com', 1893456000000000)",
        rusqlite::params![Uuid::new_v4().to_string(), slot_str],
      )?;
      Ok(())
    })
    .await;
  assert!(result.is_err());
}

#[tokio::test]
async fn concurrent_books_on_one_connection_have_one_winner() {
  let s = Arc::new(store().await);
  let slot = add_slot(&s, Uuid::new_v4(), at(9, 0)).await;

  let handles: Vec<_> = (0..20)
    .map(|i| {
      let s = Arc::clone(&s);
      let slot_id = slot.slot_id;
      tokio::spawn(async move {
        s.atomic_book(slot_id, Requester::new(format!("caller {i}"), "c@x.com"))
          .await
          .unwrap()
      })
    })
    .collect();

  let mut wins = 0;
  for h in handles {
    if let BookOutcome::Booked(_) = h.await.unwrap() {
      wins += 1;
    }
  }
  assert_eq!(wins, 1);
  assert_eq!(s.list_reservations(slot.slot_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn concurrent_books_across_connections_have_one_winner() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("slots.db");

  let first = SqliteStore::open(&path).await.unwrap();
  let slot = add_slot(&first, Uuid::new_v4(), at(9, 0)).await;

  let mut stores = vec![first];
  for _ in 1..6 {
    stores.push(SqliteStore::open(&path).await.unwrap());
  }

  let handles: Vec<_> = stores
    .iter()
    .cloned()
    .enumerate()
    .map(|(i, s)| {
      let slot_id = slot.slot_id;
      tokio::spawn(async move {
        s.atomic_book(slot_id, Requester::new(format!("caller {i}"), "c@x.com"))
          .await
          .unwrap()
      })
    })
    .collect();

  let mut wins = 0;
  let mut conflicts = 0;
  for h in handles {
    match h.await.unwrap() {
      BookOutcome::Booked(_) => wins += 1,
      BookOutcome::Conflict => conflicts += 1,
      BookOutcome::SlotNotFound => panic!("slot vanished"),
    }
  }
  assert_eq!((wins, conflicts), (1, 5));

  for s in stores {
    s.close().await.unwrap();
  }
}

// ─── Cancellation ────────────────────────────────────────────────────────────

#[tokio::test]
async fn cancel_releases_slot_and_keeps_record() {
  let s = store().await;
  let slot = add_slot(&s, Uuid::new_v4(), at(9, 0)).await;
  let r = booked(s.atomic_book(slot.slot_id, ana()).await.unwrap());

  let cancelled = match s.atomic_cancel(r.reservation_id).await.unwrap() {
    CancelOutcome::Cancelled(r) => r,
    other => panic!("expected cancellation, got {other:?}"),
  };
  assert!(matches!(cancelled.status, ReservationStatus::Cancelled { .. }));
  assert_eq!(cancelled.requester, ana());

  assert_eq!(s.get_slot(slot.slot_id).await.unwrap().unwrap().state, SlotState::Free);
  let stored = s.get_reservation(r.reservation_id).await.unwrap().unwrap();
  assert!(!stored.status.is_active());
}

#[tokio::test]
async fn cancel_twice_reports_already_cancelled() {
  let s = store().await;
  let slot = add_slot(&s, Uuid::new_v4(), at(9, 0)).await;
  let r = booked(s.atomic_book(slot.slot_id, ana()).await.unwrap());

  assert!(matches!(
    s.atomic_cancel(r.reservation_id).await.unwrap(),
    CancelOutcome::Cancelled(_)
  ));
  assert!(matches!(
    s.atomic_cancel(r.reservation_id).await.unwrap(),
    CancelOutcome::AlreadyCancelled
  ));
  assert!(!s.get_slot(slot.slot_id).await.unwrap().unwrap().is_booked());
}

#[tokio::test]
async fn cancel_missing_reservation() {
  let s = store().await;
  assert!(matches!(
    s.atomic_cancel(Uuid::new_v4()).await.unwrap(),
    CancelOutcome::NotFound
  ));
}

#[tokio::test]
async fn stale_cancel_does_not_free_rebooked_slot() {
  let s = store().await;
  let slot = add_slot(&s, Uuid::new_v4(), at(9, 0)).await;
  let r1 = booked(s.atomic_book(slot.slot_id, ana()).await.unwrap());
  s.atomic_cancel(r1.reservation_id).await.unwrap();
  let r2 = booked(s.atomic_book(slot.slot_id, bo()).await.unwrap());
  assert_ne!(r1.reservation_id, r2.reservation_id);

  // Repeating the first cancellation must not touch the new occupant.
  assert!(matches!(
    s.atomic_cancel(r1.reservation_id).await.unwrap(),
    CancelOutcome::AlreadyCancelled
  ));
  let fetched = s.get_slot(slot.slot_id).await.unwrap().unwrap();
  assert_eq!(
    fetched.state,
    SlotState::Booked { holder: bo(), reservation_id: r2.reservation_id }
  );

  let history = s.list_reservations(slot.slot_id).await.unwrap();
  let ids: Vec<_> = history.iter().map(|r| r.reservation_id).collect();
  assert_eq!(ids, vec![r1.reservation_id, r2.reservation_id]);
}

#[tokio::test]
async fn state_survives_reopen() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("slots.db");

  let s = SqliteStore::open(&path).await.unwrap();
  let slot = add_slot(&s, Uuid::new_v4(), at(9, 0)).await;
  let r = booked(s.atomic_book(slot.slot_id, ana()).await.unwrap());
  s.close().await.unwrap();

  let reopened = SqliteStore::open(&path).await.unwrap();
  assert!(reopened.get_slot(slot.slot_id).await.unwrap().unwrap().is_booked());
  assert!(
    reopened
      .get_reservation(r.reservation_id)
      .await
      .unwrap()
      .unwrap()
      .status
      .is_active()
  );
}
