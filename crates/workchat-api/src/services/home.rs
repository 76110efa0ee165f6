use workchat_types::models::HomePage;

use crate::error::ServiceError;
use crate::services::announcements::to_view;
use crate::state::AppStateInner;

pub const FEED_SIZE: u32 = 5;

/// The public feed: newest published announcements, pinned first.
pub fn home_page(state: &AppStateInner) -> Result<HomePage, ServiceError> {
    let announcements = state
        .db
        .list_published_announcements(FEED_SIZE)?
        .into_iter()
        .map(to_view)
        .collect();
    Ok(HomePage {
        announcements,
        notice: None,
    })
}

#[cfg(test)]
mod tests {
    use workchat_db::models::AnnouncementEdit;

    use super::*;
    use crate::services::test_support::state;

    #[test]
    fn feed_is_published_only_and_capped() {
        let state = state();
        for i in 0..6 {
            let edit = AnnouncementEdit {
                title: format!("news {i}"),
                body: "body".into(),
                is_pinned: i == 0,
                is_published: true,
            };
            state.db.insert_announcement(edit, None).unwrap();
        }
        let draft = AnnouncementEdit {
            title: "draft".into(),
            body: "body".into(),
            is_pinned: true,
            is_published: false,
        };
        state.db.insert_announcement(draft, None).unwrap();

        let page = home_page(&state).unwrap();
        assert_eq!(page.announcements.len(), 5);
        assert_eq!(page.announcements[0].title, "news 0");
        assert!(page.announcements.iter().all(|a| a.is_published));
    }
}
