//! Notifications slice
//!
//! Fetches are incremental and may overlap, so each fulfilled fetch runs the
//! two-phase reconciliation in [`reconcile_fetched`] on a private copy and
//! publishes the result in one step.

use super::Slice;
use crate::domain::{Notification, NotificationPatch};
use crate::errors::ReduceError;
use bulletin_core::{AsyncOperation, CollectionError, EntityCollection, Lifecycle, Reentrancy};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Tracker name for the notifications fetch.
pub const FETCH_NOTIFICATIONS: &str = "notifications/fetchNotifications";

/// State of the notifications slice.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NotificationsState {
    notifications: Arc<EntityCollection<Notification>>,
    fetch: AsyncOperation,
}

impl Default for NotificationsState {
    fn default() -> Self {
        Self {
            notifications: Arc::new(EntityCollection::sorted_by(Notification::newest_first)),
            fetch: AsyncOperation::with_reentrancy(FETCH_NOTIFICATIONS, Reentrancy::Stack),
        }
    }
}

impl NotificationsState {
    /// Initial state holding `notifications`.
    pub fn with_notifications(notifications: impl IntoIterator<Item = Notification>) -> Self {
        let mut collection = EntityCollection::sorted_by(Notification::newest_first);
        collection.set_all(notifications);
        Self {
            notifications: Arc::new(collection),
            ..Self::default()
        }
    }

    /// The notifications collection, newest first.
    pub fn notifications(&self) -> &Arc<EntityCollection<Notification>> {
        &self.notifications
    }

    /// Tracker for the notifications fetch.
    pub fn fetch(&self) -> &AsyncOperation {
        &self.fetch
    }

    /// Date of the newest held notification, used as the `since` cursor.
    pub fn latest_timestamp(&self) -> Option<DateTime<Utc>> {
        self.notifications.first().map(|n| n.date)
    }
}

/// Actions handled by [`NotificationsState`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NotificationsAction {
    /// Mark every held notification as read.
    AllNotificationsRead,
    /// Lifecycle of an incremental notifications fetch.
    FetchNotifications(Lifecycle<Vec<NotificationPatch>>),
}

impl NotificationsAction {
    /// Action tag, e.g. `"notifications/allNotificationsRead"`.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::AllNotificationsRead => "notifications/allNotificationsRead",
            Self::FetchNotifications(Lifecycle::Pending) => {
                "notifications/fetchNotifications/pending"
            }
            Self::FetchNotifications(Lifecycle::Fulfilled(_)) => {
                "notifications/fetchNotifications/fulfilled"
            }
            Self::FetchNotifications(Lifecycle::Rejected(_)) => {
                "notifications/fetchNotifications/rejected"
            }
        }
    }
}

/// Reconcile a fetched batch into the held notifications.
///
/// Phase one reclassifies every held notification: read ones stop being new,
/// unread ones stay new. Phase two upserts the batch, so server-provided
/// flags win for the records it contains. Returns whether anything changed.
/// On error the collection may hold phase-one changes; callers work on a copy.
pub fn reconcile_fetched(
    notifications: &mut EntityCollection<Notification>,
    incoming: Vec<NotificationPatch>,
) -> Result<bool, CollectionError> {
    let reclassified = notifications.modify_each(|n| {
        let is_new = !n.read;
        if n.is_new == is_new {
            return false;
        }
        n.is_new = is_new;
        true
    })?;
    let merged = notifications.upsert_many(incoming)?;
    Ok(reclassified > 0 || merged > 0)
}

impl Slice for NotificationsState {
    type Action = NotificationsAction;
    const NAME: &'static str = "notifications";

    fn reduce(state: &Arc<Self>, action: NotificationsAction) -> Result<Arc<Self>, ReduceError> {
        let mut next = NotificationsState::clone(state);
        match action {
            NotificationsAction::AllNotificationsRead => {
                if state.notifications.iter().all(|n| n.read) {
                    return Ok(Arc::clone(state));
                }
                Arc::make_mut(&mut next.notifications).modify_each(|n| {
                    if n.read {
                        return false;
                    }
                    n.read = true;
                    true
                })?;
            }
            NotificationsAction::FetchNotifications(Lifecycle::Pending) => next.fetch.begin()?,
            NotificationsAction::FetchNotifications(Lifecycle::Fulfilled(incoming)) => {
                next.fetch.succeed()?;
                let mut notifications = EntityCollection::clone(&state.notifications);
                if reconcile_fetched(&mut notifications, incoming)? {
                    next.notifications = Arc::new(notifications);
                }
            }
            NotificationsAction::FetchNotifications(Lifecycle::Rejected(message)) => {
                next.fetch.fail(message)?;
            }
        }
        Ok(Arc::new(next))
    }
}
