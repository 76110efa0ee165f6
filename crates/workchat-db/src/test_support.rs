use crate::models::UserRow;
use crate::stamp::Timestamps;
use crate::{Database, WriteKind};

pub(crate) fn user(id: &str, email: &str, user_name: &str, name: &str, last_name: &str) -> UserRow {
    UserRow {
        id: id.into(),
        user_name: user_name.into(),
        email: email.into(),
        email_confirmed: true,
        password_hash: "hash".into(),
        security_stamp: "stamp".into(),
        name: name.into(),
        last_name: last_name.into(),
        timestamps: Timestamps::pending(),
    }
}

pub(crate) fn seed_user(db: &Database, id: &str) -> UserRow {
    let mut row = user(id, &format!("{id}@example.com"), id, "Test", "User");
    db.write(|w| w.save(&mut row, WriteKind::Insert)).unwrap();
    row
}
