use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::Database;
use crate::models::{AnnouncementEdit, AnnouncementRow};
use crate::stamp::{Record, Timestamps, WriteKind};
use crate::time::SqlTime;

const ANNOUNCEMENT_COLUMNS: &str =
    "id, title, body, is_pinned, is_published, created_by_user_id, created_at, updated_at";

// Pinned first, then newest first within each group.
const FEED_ORDER: &str = "ORDER BY is_pinned DESC, created_at DESC, id DESC";

fn map_announcement(row: &Row<'_>) -> rusqlite::Result<AnnouncementRow> {
    Ok(AnnouncementRow {
        id: row.get(0)?,
        title: row.get(1)?,
        body: row.get(2)?,
        is_pinned: row.get(3)?,
        is_published: row.get(4)?,
        created_by_user_id: row.get(5)?,
        timestamps: Timestamps {
            created_at: row.get::<_, SqlTime>(6)?.0,
            updated_at: row.get::<_, SqlTime>(7)?.0,
        },
    })
}

impl Record for AnnouncementRow {
    fn timestamps_mut(&mut self) -> &mut Timestamps {
        &mut self.timestamps
    }

    fn insert(&mut self, conn: &Connection) -> Result<()> {
        conn.execute(
            "INSERT INTO announcements (title, body, is_pinned, is_published, created_by_user_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                self.title,
                self.body,
                self.is_pinned,
                self.is_published,
                self.created_by_user_id,
                SqlTime(self.timestamps.created_at),
                SqlTime(self.timestamps.updated_at),
            ],
        )?;
        self.id = conn.last_insert_rowid();
        Ok(())
    }

    fn update(&self, conn: &Connection) -> Result<()> {
        conn.execute(
            "UPDATE announcements
             SET title = ?2, body = ?3, is_pinned = ?4, is_published = ?5, updated_at = ?6
             WHERE id = ?1",
            params![
                self.id,
                self.title,
                self.body,
                self.is_pinned,
                self.is_published,
                SqlTime(self.timestamps.updated_at),
            ],
        )?;
        Ok(())
    }
}

impl Database {
    pub fn list_announcements(&self) -> Result<Vec<AnnouncementRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("SELECT {ANNOUNCEMENT_COLUMNS} FROM announcements {FEED_ORDER}"))?;
            let rows = stmt
                .query_map([], map_announcement)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn list_published_announcements(&self, limit: u32) -> Result<Vec<AnnouncementRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ANNOUNCEMENT_COLUMNS} FROM announcements WHERE is_published = 1 {FEED_ORDER} LIMIT ?1"
            ))?;
            let rows = stmt
                .query_map([limit], map_announcement)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_announcement(&self, id: i64) -> Result<Option<AnnouncementRow>> {
        self.with_conn(|conn| query_announcement(conn, id))
    }

    pub fn count_announcements(&self) -> Result<u64> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row("SELECT COUNT(*) FROM announcements", [], |r| r.get(0))?;
            Ok(n as u64)
        })
    }

    pub fn insert_announcement(&self, edit: AnnouncementEdit, created_by: Option<&str>) -> Result<AnnouncementRow> {
        self.write(|w| {
            let mut row = AnnouncementRow {
                id: 0,
                title: edit.title,
                body: edit.body,
                is_pinned: edit.is_pinned,
                is_published: edit.is_published,
                created_by_user_id: created_by.map(str::to_string),
                timestamps: Timestamps::pending(),
            };
            w.save(&mut row, WriteKind::Insert)?;
            Ok(row)
        })
    }

    /// Copy the editable fields onto an existing row. Creator and
    /// `created_at` are left untouched. Returns `None` if the row is missing.
    pub fn update_announcement(&self, id: i64, edit: AnnouncementEdit) -> Result<Option<AnnouncementRow>> {
        self.write(|w| {
            let Some(mut row) = query_announcement(w.conn(), id)? else {
                return Ok(None);
            };
            row.title = edit.title;
            row.body = edit.body;
            row.is_pinned = edit.is_pinned;
            row.is_published = edit.is_published;
            w.save(&mut row, WriteKind::Update)?;
            Ok(Some(row))
        })
    }

    pub fn delete_announcement(&self, id: i64) -> Result<bool> {
        self.write(|w| {
            let n = w.conn().execute("DELETE FROM announcements WHERE id = ?1", [id])?;
            Ok(n > 0)
        })
    }
}

fn query_announcement(conn: &Connection, id: i64) -> Result<Option<AnnouncementRow>> {
    let row = conn
        .query_row(
            &format!("SELECT {ANNOUNCEMENT_COLUMNS} FROM announcements WHERE id = ?1"),
            [id],
            map_announcement,
        )
        .optional()?;
    Ok(row)
}
