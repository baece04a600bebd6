//! Bulletin domain entities
//!
//! Posts, users and notifications, their partial ("patch") records, and the
//! typed ids that key them in their collections.

mod ids;
mod notification;
mod post;
mod user;

pub use ids::{NotificationId, PostId, UserId};
pub use notification::{Notification, NotificationPatch};
pub(crate) use post::require_text;
pub use post::{NewPost, Post, PostPatch, ReactionKind, Reactions, EXCERPT_LEN};
pub use user::{User, UserPatch};
