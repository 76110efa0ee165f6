//! Central timestamp stamping. Rows that carry `created_at`/`updated_at` are
//! written through [`Writer::save`], which stamps them first, so no write
//! path can forget to do it.

use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::Connection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    Insert,
    Update,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamps {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Timestamps {
    /// Placeholder for rows not yet persisted; overwritten on insert.
    pub fn pending() -> Self {
        Self {
            created_at: DateTime::<Utc>::UNIX_EPOCH,
            updated_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    /// Invariant: `updated_at >= created_at` after every stamp.
    pub fn stamp(&mut self, kind: WriteKind, now: DateTime<Utc>) {
        match kind {
            WriteKind::Insert => {
                self.created_at = now;
                self.updated_at = now;
            }
            WriteKind::Update => {
                self.updated_at = now.max(self.created_at);
            }
        }
    }
}

/// A timestamped row that knows how to insert and update itself.
pub trait Record {
    fn timestamps_mut(&mut self) -> &mut Timestamps;

    /// Insert the row; implementations assign generated keys back onto `self`.
    fn insert(&mut self, conn: &Connection) -> Result<()>;

    fn update(&self, conn: &Connection) -> Result<()>;
}

/// Write handle for one transaction; see [`crate::Database::write`].
pub struct Writer<'a> {
    conn: &'a Connection,
    now: DateTime<Utc>,
}

impl<'a> Writer<'a> {
    pub(crate) fn new(conn: &'a Connection, now: DateTime<Utc>) -> Self {
        Self { conn, now }
    }

    pub fn conn(&self) -> &Connection {
        self.conn
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn save<R: Record>(&self, record: &mut R, kind: WriteKind) -> Result<()> {
        record.timestamps_mut().stamp(kind, self.now);
        match kind {
            WriteKind::Insert => record.insert(self.conn),
            WriteKind::Update => record.update(self.conn),
        }
    }
}
