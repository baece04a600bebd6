//! Workflows - Async Commands Against the Remote API
//!
//! Each workflow drives one tracked operation through its lifecycle:
//! dispatch `Pending`, await the transport, dispatch `Fulfilled` or
//! `Rejected`. Transport failures are recorded in the tracker and reported as
//! [`FetchOutcome::Failed`]; only precondition violations come back as `Err`.
//!
//! Workflows borrow the [`Store`] and hold no lock across an `.await`, so
//! several may run concurrently against one store.

pub mod notifications;
pub mod posts;
pub mod users;

pub use notifications::fetch_notifications;
pub use posts::{add_new_post, fetch_posts, refetch_posts};
pub use users::fetch_users;

use crate::errors::{ReduceError, TransportError, WorkflowError};
use crate::store::{RootAction, Store};
use tracing::{debug, warn};

/// Result of a fetch workflow.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The fetch did not run (already loaded, or another caller is fetching).
    Skipped,
    /// The payload was applied.
    Succeeded {
        /// Records received.
        count: usize,
    },
    /// The fetch failed; the message is also recorded in the tracker.
    Failed {
        /// Tracker error message.
        message: String,
    },
}

impl FetchOutcome {
    /// Whether the fetch ran and succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }
}

/// Load the data needed before anything is rendered.
///
/// **What it does**: Fetches the user directory
/// **Returns**: Outcome of the users fetch
pub async fn bootstrap(store: &Store) -> Result<FetchOutcome, WorkflowError> {
    fetch_users(store).await
}

/// Settle a fetch whose `Pending` has been dispatched.
///
/// A payload the reducer refuses as incomplete is treated like a malformed
/// response: the fetch is settled as rejected.
fn settle_fetch<T, A>(
    store: &Store,
    operation: &'static str,
    path: &str,
    result: Result<Vec<T>, TransportError>,
    fulfilled: impl FnOnce(Vec<T>) -> A,
    rejected: impl FnOnce(String) -> A,
) -> Result<FetchOutcome, WorkflowError>
where
    A: Into<RootAction>,
{
    let records = match result {
        Ok(records) => records,
        Err(err) => {
            warn!(operation, path, error = %err, "fetch failed");
            let message = err.to_string();
            store.dispatch(rejected(message.clone()))?;
            return Ok(FetchOutcome::Failed { message });
        }
    };

    let count = records.len();
    match store.dispatch(fulfilled(records)) {
        Ok(()) => {
            debug!(operation, path, count, "fetch succeeded");
            Ok(FetchOutcome::Succeeded { count })
        }
        Err(ReduceError::Collection(err)) => {
            let err = TransportError::Decode {
                path: path.to_string(),
                reason: err.to_string(),
            };
            warn!(operation, path, error = %err, "fetch returned unusable records");
            let message = err.to_string();
            store.dispatch(rejected(message.clone()))?;
            Ok(FetchOutcome::Failed { message })
        }
        Err(err) => Err(err.into()),
    }
}

/// Dispatch the start of a guarded fetch; `false` if another caller won.
fn begin_guarded(
    store: &Store,
    operation: &'static str,
    action: impl Into<RootAction>,
) -> Result<bool, WorkflowError> {
    match store.dispatch(action) {
        Ok(()) => Ok(true),
        Err(err) if err.is_already_started() => {
            debug!(operation, error = %err, "fetch already started, skipped");
            Ok(false)
        }
        Err(err) => Err(err.into()),
    }
}
