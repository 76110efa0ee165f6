//! Row types as stored in SQLite. Kept apart from the serde view models in
//! workchat-types so the store does not depend on the HTTP layer.

use crate::stamp::Timestamps;

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: String,
    pub user_name: String,
    pub email: String,
    pub email_confirmed: bool,
    pub password_hash: String,
    pub security_stamp: String,
    pub name: String,
    pub last_name: String,
    pub timestamps: Timestamps,
}

#[derive(Debug, Clone)]
pub struct RoleRow {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct ChatRoomRow {
    pub id: i64,
    pub name: Option<String>,
    pub is_group: bool,
    pub created_by_user_id: String,
    pub timestamps: Timestamps,
}

#[derive(Debug, Clone)]
pub struct ParticipantRow {
    pub chat_room_id: i64,
    pub user_id: String,
    pub is_admin: bool,
    pub timestamps: Timestamps,
}

#[derive(Debug, Clone)]
pub struct MessageRow {
    pub id: i64,
    pub chat_room_id: i64,
    pub sender_id: String,
    pub text: String,
    pub is_edited: bool,
    pub is_deleted: bool,
    pub timestamps: Timestamps,
}

#[derive(Debug, Clone)]
pub struct AnnouncementRow {
    pub id: i64,
    pub title: String,
    pub body: String,
    pub is_pinned: bool,
    pub is_published: bool,
    pub created_by_user_id: Option<String>,
    pub timestamps: Timestamps,
}

/// The client-editable part of an announcement.
#[derive(Debug, Clone)]
pub struct AnnouncementEdit {
    pub title: String,
    pub body: String,
    pub is_pinned: bool,
    pub is_published: bool,
}
