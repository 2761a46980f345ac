//! SQL schema for the slotbook SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS time_slots (
    slot_id         TEXT PRIMARY KEY,
    resource_id     TEXT NOT NULL,
    start_at        INTEGER NOT NULL,   -- microseconds since the Unix epoch, UTC
    end_at          INTEGER NOT NULL,
    created_at      INTEGER NOT NULL,
    booked          INTEGER NOT NULL DEFAULT 0,
    holder_name     TEXT,
    holder_contact  TEXT,
    reservation_id  TEXT,            -- the active reservation occupying the slot
    CHECK (start_at < end_at),
    CHECK (
        (booked = 0 AND holder_name IS NULL AND holder_contact IS NULL
                    AND reservation_id IS NULL)
     OR (booked = 1 AND holder_name IS NOT NULL AND holder_contact IS NOT NULL
                    AND reservation_id IS NOT NULL)
    )
);

-- Reservations are never deleted; cancellation only flips the status.
CREATE TABLE IF NOT EXISTS reservations (
    reservation_id    TEXT PRIMARY KEY,
    slot_id           TEXT NOT NULL REFERENCES time_slots(slot_id),
    requester_name    TEXT NOT NULL,
    requester_contact TEXT NOT NULL,
    created_at        INTEGER NOT NULL,
    status            TEXT NOT NULL DEFAULT 'active'
                      CHECK (status IN ('active', 'cancelled')),
    cancelled_at      INTEGER,
    CHECK ((status = 'active') = (cancelled_at IS NULL))
);

-- At most one active reservation per slot.
CREATE UNIQUE INDEX IF NOT EXISTS reservations_active_slot_idx
    ON reservations(slot_id) WHERE status = 'active';

CREATE INDEX IF NOT EXISTS time_slots_start_idx    ON time_slots(start_at);
CREATE INDEX IF NOT EXISTS time_slots_resource_idx ON time_slots(resource_id, start_at);
CREATE INDEX IF NOT EXISTS reservations_slot_idx   ON reservations(slot_id, created_at);

PRAGMA user_version = 1;
";
