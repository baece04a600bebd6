//! Users slice: the author directory, replaced wholesale on every fetch.

use super::Slice;
use crate::domain::User;
use crate::errors::ReduceError;
use bulletin_core::{AsyncOperation, EntityCollection, Lifecycle, Reentrancy};
use std::sync::Arc;

/// Tracker name for the user list fetch.
pub const FETCH_USERS: &str = "users/fetchUsers";

/// State of the users slice.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UsersState {
    users: Arc<EntityCollection<User>>,
    fetch: AsyncOperation,
}

impl Default for UsersState {
    fn default() -> Self {
        Self {
            users: Arc::new(EntityCollection::new()),
            fetch: AsyncOperation::with_reentrancy(FETCH_USERS, Reentrancy::Stack),
        }
    }
}

impl UsersState {
    /// Initial state holding `users` in the given order.
    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        let mut collection = EntityCollection::new();
        collection.set_all(users);
        Self {
            users: Arc::new(collection),
            ..Self::default()
        }
    }

    /// The users collection, in server order.
    pub fn users(&self) -> &Arc<EntityCollection<User>> {
        &self.users
    }

    /// Tracker for the user list fetch.
    pub fn fetch(&self) -> &AsyncOperation {
        &self.fetch
    }
}

/// Actions handled by [`UsersState`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UsersAction {
    /// Lifecycle of the user list fetch. The fulfilled payload replaces the
    /// whole collection.
    FetchUsers(Lifecycle<Vec<User>>),
}

impl UsersAction {
    /// Action tag, e.g. `"users/fetchUsers/fulfilled"`.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::FetchUsers(Lifecycle::Pending) => "users/fetchUsers/pending",
            Self::FetchUsers(Lifecycle::Fulfilled(_)) => "users/fetchUsers/fulfilled",
            Self::FetchUsers(Lifecycle::Rejected(_)) => "users/fetchUsers/rejected",
        }
    }
}

impl Slice for UsersState {
    type Action = UsersAction;
    const NAME: &'static str = "users";

    fn reduce(state: &Arc<Self>, action: UsersAction) -> Result<Arc<Self>, ReduceError> {
        let mut next = UsersState::clone(state);
        match action {
            UsersAction::FetchUsers(Lifecycle::Pending) => next.fetch.begin()?,
            UsersAction::FetchUsers(Lifecycle::Fulfilled(users)) => {
                next.fetch.succeed()?;
                let mut collection = EntityCollection::new();
                collection.set_all(users);
                next.users = Arc::new(collection);
            }
            UsersAction::FetchUsers(Lifecycle::Rejected(message)) => next.fetch.fail(message)?,
        }
        Ok(Arc::new(next))
    }
}
