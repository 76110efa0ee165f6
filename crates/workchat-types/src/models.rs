use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ADMIN_ROLE;
use crate::paging::{PageRequest, total_pages};

// -- Notices --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Error,
}

/// One-shot message shown on the page rendered after a redirect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            text: text.into(),
        }
    }
}

// -- Users --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: String,
    pub email: String,
    pub user_name: String,
    pub name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub roles: Vec<String>,
    pub is_admin: bool,
}

impl UserSummary {
    pub fn has_admin_role(roles: &[String]) -> bool {
        roles.iter().any(|r| r == ADMIN_ROLE)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsersPage {
    pub users: Vec<UserSummary>,
    pub q: Option<String>,
    pub page: u32,
    pub page_size: u32,
    pub total_count: u64,
    pub total_pages: u64,
    pub has_prev: bool,
    pub has_next: bool,
    pub notice: Option<Notice>,
}

impl UsersPage {
    pub fn new(users: Vec<UserSummary>, q: Option<String>, paging: PageRequest, total_count: u64) -> Self {
        let total_pages = total_pages(total_count, paging.page_size);
        Self {
            users,
            q,
            page: paging.page,
            page_size: paging.page_size,
            total_count,
            total_pages,
            has_prev: paging.page > 1,
            has_next: (paging.page as u64) < total_pages,
            notice: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetPasswordPage {
    pub user_id: String,
    pub email: String,
    pub q: Option<String>,
    pub page: u32,
    pub page_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminOverview {
    pub user_count: u64,
    pub admin_count: u64,
    pub announcement_count: u64,
    pub notice: Option<Notice>,
}

// -- Announcements --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Announcement {
    pub id: i64,
    pub title: String,
    pub body: String,
    pub is_pinned: bool,
    pub is_published: bool,
    pub created_by_user_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnouncementsPage {
    pub announcements: Vec<Announcement>,
    pub notice: Option<Notice>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HomePage {
    pub announcements: Vec<Announcement>,
    pub notice: Option<Notice>,
}

// -- Chat --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRoomListItem {
    pub id: i64,
    pub name: String,
    pub is_group: bool,
    pub last_updated_utc: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatIndexPage {
    pub rooms: Vec<ChatRoomListItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomView {
    pub room_id: i64,
    pub room_title: String,
}

// -- Account --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginPage {
    pub email: String,
    pub return_url: Option<String>,
    pub errors: Vec<String>,
    pub notice: Option<Notice>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn users_page_navigation_flags() {
        let paging = PageRequest::clamp(Some(1), Some(10));
        let page = UsersPage::new(vec![], Some("ann".into()), paging, 3);
        assert_eq!(page.total_pages, 1);
        assert!(!page.has_prev);
        assert!(!page.has_next);

        let paging = PageRequest::clamp(Some(2), Some(5));
        let page = UsersPage::new(vec![], None, paging, 12);
        assert_eq!(page.total_pages, 3);
        assert!(page.has_prev);
        assert!(page.has_next);
    }

    #[test]
    fn admin_flag_derives_from_roles() {
        assert!(UserSummary::has_admin_role(&["Staff".into(), "Admin".into()]));
        assert!(!UserSummary::has_admin_role(&["admin".into()]));
        assert!(!UserSummary::has_admin_role(&[]));
    }
}
