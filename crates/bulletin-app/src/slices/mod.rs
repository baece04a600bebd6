//! # Collection Slices
//!
//! Each slice owns one entity collection plus the trackers for the remote
//! operations that feed it. Slices are pure: `reduce` maps the current state
//! and one action to the next state, and returns the *same* `Arc` when the
//! action changed nothing. Memoized selectors rely on that to skip work.
//!
//! Errors returned from `reduce` leave the state untouched. Reducers build
//! the next state on a copy and only publish it on success.

pub mod notifications;
pub mod posts;
pub mod users;

pub use notifications::{NotificationsAction, NotificationsState};
pub use posts::{PostsAction, PostsState};
pub use users::{UsersAction, UsersState};

use crate::errors::ReduceError;
use std::fmt::Debug;
use std::sync::Arc;

/// A pure state container for one part of the root state.
pub trait Slice: Clone + Debug + Default + Send + Sync + 'static {
    /// Actions this slice responds to.
    type Action: Debug + Send;

    /// Slice name, used as the action tag prefix (`"posts"`).
    const NAME: &'static str;

    /// Apply one action.
    fn reduce(state: &Arc<Self>, action: Self::Action) -> Result<Arc<Self>, ReduceError>;
}
