//! Entity fixtures.

use bulletin_app::{Notification, NotificationPatch, Post, PostPatch, Reactions, User};
use chrono::{DateTime, Utc};

/// Parse an RFC 3339 timestamp.
pub fn ts(rfc3339: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(rfc3339)
        .expect("fixture timestamp must be RFC 3339")
        .with_timezone(&Utc)
}

/// A post by `user` at `date` with no reactions.
pub fn post(id: &str, user: &str, date: &str) -> Post {
    Post {
        id: id.into(),
        title: format!("Post {id}"),
        content: format!("Content of post {id}"),
        date: ts(date),
        user: user.into(),
        reactions: Reactions::default(),
    }
}

/// A user.
pub fn user(id: &str, name: &str) -> User {
    User::new(id, name)
}

/// A notification about `user`.
pub fn notification(id: &str, user: &str, date: &str, read: bool, is_new: bool) -> Notification {
    Notification {
        id: id.into(),
        date: ts(date),
        user: user.into(),
        message: format!("notification {id}"),
        read,
        is_new,
    }
}

/// A fresh unread notification, as the server sends it.
pub fn unread(id: &str, user: &str, date: &str) -> Notification {
    notification(id, user, date, false, true)
}

/// Full patch for a post.
pub fn post_patch(post: &Post) -> PostPatch {
    PostPatch::from(post.clone())
}

/// Full patch for a notification.
pub fn notification_patch(notification: &Notification) -> NotificationPatch {
    NotificationPatch::from(notification.clone())
}
