use tracing::warn;

use workchat_db::models::ChatRoomRow;
use workchat_types::models::{ChatIndexPage, ChatRoomListItem, RoomView};

use crate::error::ServiceError;
use crate::state::AppStateInner;

pub const DIRECT_CHAT_TITLE: &str = "Direct Chat";
pub const UNNAMED_GROUP_TITLE: &str = "Unnamed Group";

/// Direct rooms are always "Direct Chat"; group rooms use their name.
pub fn display_name(room: &ChatRoomRow) -> String {
    if !room.is_group {
        return DIRECT_CHAT_TITLE.to_string();
    }
    room.name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(UNNAMED_GROUP_TITLE)
        .to_string()
}

/// Rooms the user participates in, most recently active first.
pub fn list_rooms(state: &AppStateInner, user_id: &str) -> Result<ChatIndexPage, ServiceError> {
    let rooms = state
        .db
        .get_rooms_for_user(user_id)?
        .into_iter()
        .map(|room| ChatRoomListItem {
            id: room.id,
            name: display_name(&room),
            is_group: room.is_group,
            last_updated_utc: room.timestamps.updated_at,
        })
        .collect();
    Ok(ChatIndexPage { rooms })
}

/// Only participants may open a room. A missing room is `NotFound` whether
/// or not the caller could have been a member.
pub fn open_room(state: &AppStateInner, user_id: &str, room_id: i64) -> Result<RoomView, ServiceError> {
    let (room, is_member) = state
        .db
        .get_room_access(room_id, user_id)?
        .ok_or(ServiceError::NotFound)?;
    if !is_member {
        warn!("User {} is not a participant of room {}", user_id, room_id);
        return Err(ServiceError::Forbidden);
    }

    Ok(RoomView {
        room_id: room.id,
        room_title: display_name(&room),
    })
}
