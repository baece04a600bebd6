//! Users Workflow

use super::{settle_fetch, FetchOutcome};
use crate::domain::User;
use crate::errors::WorkflowError;
use crate::slices::users::FETCH_USERS;
use crate::slices::UsersAction;
use crate::store::Store;
use crate::transport::extract_field;
use bulletin_core::Lifecycle;
use tracing::debug;

/// Load the user directory, replacing whatever is held.
///
/// **What it does**: Fetches all users
/// **Returns**: Outcome of the fetch; overlapping calls are allowed and the
/// last one to complete decides the final status
pub async fn fetch_users(store: &Store) -> Result<FetchOutcome, WorkflowError> {
    store.dispatch(UsersAction::FetchUsers(Lifecycle::Pending))?;
    let path = store.config().users_path();
    debug!(operation = FETCH_USERS, %path, "fetch started");

    let result = store
        .transport()
        .get(&path)
        .await
        .and_then(|payload| extract_field::<Vec<User>>(&path, payload, "users"));
    settle_fetch(
        store,
        FETCH_USERS,
        &path,
        result,
        |users| UsersAction::FetchUsers(Lifecycle::Fulfilled(users)),
        |message| UsersAction::FetchUsers(Lifecycle::Rejected(message)),
    )
}
