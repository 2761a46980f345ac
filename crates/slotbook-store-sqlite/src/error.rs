//! Error type for `slotbook-store-sqlite`.
//!
//! Only storage failures live here. Booking conflicts and missing records are
//! reported through [`BookOutcome`](slotbook_core::store::BookOutcome) and
//! [`CancelOutcome`](slotbook_core::store::CancelOutcome) instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unknown reservation status: {0:?}")]
  UnknownStatus(String),

  /// A row violates an invariant the schema is supposed to enforce.
  #[error("inconsistent row: {0}")]
  Inconsistent(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
