//! Notifications Workflow

use super::{settle_fetch, FetchOutcome};
use crate::domain::NotificationPatch;
use crate::errors::WorkflowError;
use crate::selectors::select_latest_notification_date;
use crate::slices::notifications::FETCH_NOTIFICATIONS;
use crate::slices::NotificationsAction;
use crate::store::Store;
use crate::transport::extract_field;
use bulletin_core::Lifecycle;
use tracing::debug;

/// Fetch notifications newer than the newest one held.
///
/// **What it does**: Requests `notifications?since=<newest date>` and
/// reconciles the result into the held set
/// **Returns**: Outcome of the fetch
///
/// Not guarded: a user may trigger a refresh while another is in flight.
/// The cursor is read when the call starts, so overlapping calls may receive
/// overlapping batches; the upsert makes that harmless.
pub async fn fetch_notifications(store: &Store) -> Result<FetchOutcome, WorkflowError> {
    let since = select_latest_notification_date(&store.state());
    let path = store.config().notifications_path(since);
    store.dispatch(NotificationsAction::FetchNotifications(Lifecycle::Pending))?;
    debug!(operation = FETCH_NOTIFICATIONS, %path, "fetch started");

    let result = store
        .transport()
        .get(&path)
        .await
        .and_then(|payload| {
            extract_field::<Vec<NotificationPatch>>(&path, payload, "notifications")
        });
    settle_fetch(
        store,
        FETCH_NOTIFICATIONS,
        &path,
        result,
        |incoming| NotificationsAction::FetchNotifications(Lifecycle::Fulfilled(incoming)),
        |message| NotificationsAction::FetchNotifications(Lifecycle::Rejected(message)),
    )
}
