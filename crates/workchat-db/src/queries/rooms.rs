use anyhow::{Result, bail};
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::models::{ChatRoomRow, MessageRow, ParticipantRow};
use crate::stamp::{Record, Timestamps, WriteKind};
use crate::time::SqlTime;
use crate::{Database, Writer};

const ROOM_COLUMNS: &str = "r.id, r.name, r.is_group, r.created_by_user_id, r.created_at, r.updated_at";

fn map_room(row: &Row<'_>) -> rusqlite::Result<ChatRoomRow> {
    Ok(ChatRoomRow {
        id: row.get(0)?,
        name: row.get(1)?,
        is_group: row.get(2)?,
        created_by_user_id: row.get(3)?,
        timestamps: Timestamps {
            created_at: row.get::<_, SqlTime>(4)?.0,
            updated_at: row.get::<_, SqlTime>(5)?.0,
        },
    })
}

impl Record for ChatRoomRow {
    fn timestamps_mut(&mut self) -> &mut Timestamps {
        &mut self.timestamps
    }

    fn insert(&mut self, conn: &Connection) -> Result<()> {
        conn.execute(
            "INSERT INTO chat_rooms (name, is_group, created_by_user_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                self.name,
                self.is_group,
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
            "UPDATE chat_rooms SET name = ?2, is_group = ?3, updated_at = ?4 WHERE id = ?1",
            params![self.id, self.name, self.is_group, SqlTime(self.timestamps.updated_at)],
        )?;
        Ok(())
    }
}

impl Record for ParticipantRow {
    fn timestamps_mut(&mut self) -> &mut Timestamps {
        &mut self.timestamps
    }

    fn insert(&mut self, conn: &Connection) -> Result<()> {
        conn.execute(
            "INSERT INTO chat_room_participants (chat_room_id, user_id, is_admin, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                self.chat_room_id,
                self.user_id,
                self.is_admin,
                SqlTime(self.timestamps.created_at),
                SqlTime(self.timestamps.updated_at),
            ],
        )?;
        Ok(())
    }

    fn update(&self, conn: &Connection) -> Result<()> {
        conn.execute(
            "UPDATE chat_room_participants SET is_admin = ?3, updated_at = ?4
             WHERE chat_room_id = ?1 AND user_id = ?2",
            params![
                self.chat_room_id,
                self.user_id,
                self.is_admin,
                SqlTime(self.timestamps.updated_at)
            ],
        )?;
        Ok(())
    }
}

impl Record for MessageRow {
    fn timestamps_mut(&mut self) -> &mut Timestamps {
        &mut self.timestamps
    }

    fn insert(&mut self, conn: &Connection) -> Result<()> {
        conn.execute(
            "INSERT INTO messages (chat_room_id, sender_id, text, is_edited, is_deleted, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                self.chat_room_id,
                self.sender_id,
                self.text,
                self.is_edited,
                self.is_deleted,
                SqlTime(self.timestamps.created_at),
                SqlTime(self.timestamps.updated_at),
            ],
        )?;
        self.id = conn.last_insert_rowid();
        Ok(())
    }

    fn update(&self, conn: &Connection) -> Result<()> {
        conn.execute(
            "UPDATE messages SET text = ?2, is_edited = ?3, is_deleted = ?4, updated_at = ?5 WHERE id = ?1",
            params![
                self.id,
                self.text,
                self.is_edited,
                self.is_deleted,
                SqlTime(self.timestamps.updated_at)
            ],
        )?;
        Ok(())
    }
}

impl Database {
    /// Create a room. The creator joins as a room admin; `members` join as
    /// regular participants.
    pub fn create_room(
        &self,
        name: Option<&str>,
        is_group: bool,
        created_by: &str,
        members: &[&str],
    ) -> Result<ChatRoomRow> {
        self.write(|w| {
            let mut room = ChatRoomRow {
                id: 0,
                name: name.map(str::to_string),
                is_group,
                created_by_user_id: created_by.to_string(),
                timestamps: Timestamps::pending(),
            };
            w.save(&mut room, WriteKind::Insert)?;

            insert_participant(w, room.id, created_by, true)?;
            for member in members.iter().filter(|m| **m != created_by) {
                insert_participant(w, room.id, member, false)?;
            }
            Ok(room)
        })
    }

    /// Fails with a primary-key violation if the user is already a member.
    pub fn add_participant(&self, room_id: i64, user_id: &str, is_admin: bool) -> Result<ParticipantRow> {
        self.write(|w| insert_participant(w, room_id, user_id, is_admin))
    }

    /// Rooms the user participates in, most recently updated first.
    pub fn get_rooms_for_user(&self, user_id: &str) -> Result<Vec<ChatRoomRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ROOM_COLUMNS}
                 FROM chat_room_participants p
                 JOIN chat_rooms r ON r.id = p.chat_room_id
                 WHERE p.user_id = ?1
                 ORDER BY r.updated_at DESC, r.id DESC"
            ))?;
            let rows = stmt
                .query_map([user_id], map_room)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// The room and whether `user_id` has a participant row for it, or
    /// `None` if the room does not exist.
    pub fn get_room_access(&self, room_id: i64, user_id: &str) -> Result<Option<(ChatRoomRow, bool)>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    &format!(
                        "SELECT {ROOM_COLUMNS},
                                EXISTS (SELECT 1 FROM chat_room_participants p
                                        WHERE p.chat_room_id = r.id AND p.user_id = ?2)
                         FROM chat_rooms r
                         WHERE r.id = ?1"
                    ),
                    params![room_id, user_id],
                    |row| Ok((map_room(row)?, row.get::<_, bool>(6)?)),
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn get_room(&self, room_id: i64) -> Result<Option<ChatRoomRow>> {
        self.with_conn(|conn| query_room(conn, room_id))
    }

    /// Insert a message and bump the room's `updated_at`.
    pub fn insert_message(&self, room_id: i64, sender_id: &str, text: &str) -> Result<MessageRow> {
        if text.trim().is_empty() {
            bail!("message text is required");
        }

        self.write(|w| {
            let mut message = MessageRow {
                id: 0,
                chat_room_id: room_id,
                sender_id: sender_id.to_string(),
                text: text.to_string(),
                is_edited: false,
                is_deleted: false,
                timestamps: Timestamps::pending(),
            };
            w.save(&mut message, WriteKind::Insert)?;

            touch(w, room_id)?;
            Ok(message)
        })
    }

    /// Refresh the room's `updated_at`. Returns false if the room is missing.
    pub fn touch_room(&self, room_id: i64) -> Result<bool> {
        self.write(|w| touch(w, room_id))
    }

    pub fn count_messages(&self, room_id: i64) -> Result<u64> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row(
                "SELECT COUNT(*) FROM messages WHERE chat_room_id = ?1",
                [room_id],
                |r| r.get(0),
            )?;
            Ok(n as u64)
        })
    }

    /// Deleting a room removes its participants and messages.
    pub fn delete_room(&self, room_id: i64) -> Result<bool> {
        self.write(|w| {
            let n = w.conn().execute("DELETE FROM chat_rooms WHERE id = ?1", [room_id])?;
            Ok(n > 0)
        })
    }
}

fn insert_participant(w: &Writer<'_>, room_id: i64, user_id: &str, is_admin: bool) -> Result<ParticipantRow> {
    let mut participant = ParticipantRow {
        chat_room_id: room_id,
        user_id: user_id.to_string(),
        is_admin,
        timestamps: Timestamps::pending(),
    };
    w.save(&mut participant, WriteKind::Insert)?;
    Ok(participant)
}

fn touch(w: &Writer<'_>, room_id: i64) -> Result<bool> {
    let Some(mut room) = query_room(w.conn(), room_id)? else {
        return Ok(false);
    };
    w.save(&mut room, WriteKind::Update)?;
    Ok(true)
}

fn query_room(conn: &Connection, room_id: i64) -> Result<Option<ChatRoomRow>> {
    let row = conn
        .query_row(
            &format!("SELECT {ROOM_COLUMNS} FROM chat_rooms r WHERE r.id = ?1"),
            [room_id],
            map_room,
        )
        .optional()?;
    Ok(row)
}
