//! Notifications and their read/new flags.
//!
//! `read` is set locally when the user marks everything as read. `is_new`
//! is derived on each fetch: a notification stays new until a fetch happens
//! after it was read.

use super::{NotificationId, UserId};
use bulletin_core::{CollectionError, Entity, EntityPatch};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A notification as held in the store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Unique id.
    pub id: NotificationId,
    /// When the event happened; the collection sorts on it.
    pub date: DateTime<Utc>,
    /// User the notification is about.
    pub user: UserId,
    /// Text shown after the user's name.
    pub message: String,
    /// The reader has marked it read.
    #[serde(default)]
    pub read: bool,
    /// Not yet seen before the previous fetch.
    #[serde(default = "default_is_new")]
    pub is_new: bool,
}

fn default_is_new() -> bool {
    true
}

impl Notification {
    /// Sort order of the notifications collection: newest first.
    pub fn newest_first(a: &Notification, b: &Notification) -> Ordering {
        b.date.cmp(&a.date)
    }
}

impl Entity for Notification {
    type Id = NotificationId;
    type Patch = NotificationPatch;
    const KIND: &'static str = "notification";

    fn id(&self) -> &NotificationId {
        &self.id
    }
}

/// Partial notification record, as delivered by the server. Fields mirror
/// [`Notification`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct NotificationPatch {
    pub id: NotificationId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_new: Option<bool>,
}

impl From<Notification> for NotificationPatch {
    fn from(n: Notification) -> Self {
        Self {
            id: n.id,
            date: Some(n.date),
            user: Some(n.user),
            message: Some(n.message),
            read: Some(n.read),
            is_new: Some(n.is_new),
        }
    }
}

impl EntityPatch<Notification> for NotificationPatch {
    fn id(&self) -> &NotificationId {
        &self.id
    }

    fn apply_to(self, n: &mut Notification) {
        if let Some(date) = self.date {
            n.date = date;
        }
        if let Some(user) = self.user {
            n.user = user;
        }
        if let Some(message) = self.message {
            n.message = message;
        }
        if let Some(read) = self.read {
            n.read = read;
        }
        if let Some(is_new) = self.is_new {
            n.is_new = is_new;
        }
    }

    fn into_entity(self) -> Result<Notification, CollectionError> {
        let missing = |field| CollectionError::incomplete(Notification::KIND, &self.id, field);
        let date = self.date.ok_or_else(|| missing("date"))?;
        let user = self.user.ok_or_else(|| missing("user"))?;
        let message = self.message.ok_or_else(|| missing("message"))?;
        Ok(Notification {
            id: self.id,
            date,
            user,
            message,
            read: self.read.unwrap_or(false),
            is_new: self.is_new.unwrap_or_else(default_is_new),
        })
    }
}
