//! # Store Composition
//!
//! [`RootState`] combines the three slices; [`reduce_root`] routes a
//! [`RootAction`] to the slice that owns it. [`Store`] holds the current root
//! state and is the single writer:
//!
//! - `dispatch` runs under a writer lock, so transitions are serialized and
//!   each one sees the result of the previous one
//! - the new state is published before listeners run, and listeners run
//!   after the lock is released, so a listener may dispatch again
//! - every listener call reads the latest state, so a nested dispatch is
//!   never followed by an older state
//! - a rejected transition leaves the state untouched and notifies nobody
//!
//! The store is constructed explicitly with its transport and effects.
//! There is no global instance.

use crate::config::BulletinConfig;
use crate::domain::{require_text, NewPost, Post, PostId};
use crate::errors::{ReduceError, WorkflowError};
use crate::selectors::Selectors;
use crate::slices::{
    NotificationsAction, NotificationsState, PostsAction, PostsState, Slice, UsersAction,
    UsersState,
};
use crate::transport::Transport;
use bulletin_core::{
    Clock, Dynamic, IdGenerator, ListenerId, Listeners, Subscription, SystemClock, UuidGenerator,
};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, error, trace};

// ─── Root State ──────────────────────────────────────────────────────────────

/// The whole application state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RootState {
    /// Posts and their fetch/create trackers.
    pub posts: Arc<PostsState>,
    /// Author directory.
    pub users: Arc<UsersState>,
    /// Notifications and their fetch tracker.
    pub notifications: Arc<NotificationsState>,
}

/// Every action the store accepts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RootAction {
    /// Routed to [`PostsState`].
    Posts(PostsAction),
    /// Routed to [`UsersState`].
    Users(UsersAction),
    /// Routed to [`NotificationsState`].
    Notifications(NotificationsAction),
}

impl RootAction {
    /// Action tag, e.g. `"posts/reactionAdded"`.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Posts(action) => action.name(),
            Self::Users(action) => action.name(),
            Self::Notifications(action) => action.name(),
        }
    }
}

impl From<PostsAction> for RootAction {
    fn from(action: PostsAction) -> Self {
        Self::Posts(action)
    }
}

impl From<UsersAction> for RootAction {
    fn from(action: UsersAction) -> Self {
        Self::Users(action)
    }
}

impl From<NotificationsAction> for RootAction {
    fn from(action: NotificationsAction) -> Self {
        Self::Notifications(action)
    }
}

/// Apply one action to the root state.
///
/// Returns the same `Arc` when the owning slice reported no change.
pub fn reduce_root(
    state: &Arc<RootState>,
    action: RootAction,
) -> Result<Arc<RootState>, ReduceError> {
    match action {
        RootAction::Posts(action) => {
            let posts = PostsState::reduce(&state.posts, action)?;
            Ok(replace_slice(state, &state.posts, posts, |root, posts| root.posts = posts))
        }
        RootAction::Users(action) => {
            let users = UsersState::reduce(&state.users, action)?;
            Ok(replace_slice(state, &state.users, users, |root, users| root.users = users))
        }
        RootAction::Notifications(action) => {
            let notifications = NotificationsState::reduce(&state.notifications, action)?;
            Ok(replace_slice(
                state,
                &state.notifications,
                notifications,
                |root, notifications| root.notifications = notifications,
            ))
        }
    }
}

fn replace_slice<S>(
    root: &Arc<RootState>,
    current: &Arc<S>,
    next: Arc<S>,
    assign: impl FnOnce(&mut RootState, Arc<S>),
) -> Arc<RootState> {
    if Arc::ptr_eq(current, &next) {
        return Arc::clone(root);
    }
    let mut updated = RootState::clone(root);
    assign(&mut updated, next);
    Arc::new(updated)
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// The application store.
pub struct Store {
    state: Dynamic<Arc<RootState>>,
    writer: Mutex<()>,
    listeners: Listeners<Arc<RootState>>,
    selectors: Selectors,
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    config: BulletinConfig,
}

impl Store {
    /// Start building a store around `transport`.
    pub fn builder(transport: Arc<dyn Transport>) -> StoreBuilder {
        StoreBuilder {
            transport,
            config: None,
            clock: None,
            ids: None,
            initial_state: None,
        }
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    /// Current root state.
    pub fn state(&self) -> Arc<RootState> {
        self.state.get()
    }

    /// Number of published state changes.
    pub fn version(&self) -> u64 {
        self.state.version()
    }

    /// Memoized selectors bound to this store.
    pub fn selectors(&self) -> &Selectors {
        &self.selectors
    }

    /// Remote API used by workflows.
    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    /// Clock used when preparing actions.
    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Id generator used when preparing actions.
    pub fn id_generator(&self) -> &dyn IdGenerator {
        self.ids.as_ref()
    }

    /// Store configuration.
    pub fn config(&self) -> &BulletinConfig {
        &self.config
    }

    // ─── Subscriptions ───────────────────────────────────────────────────

    /// Call `listener` with the new state after every accepted dispatch.
    pub fn subscribe(
        &self,
        listener: impl Fn(&Arc<RootState>) + Send + Sync + 'static,
    ) -> ListenerId {
        self.listeners.add(listener)
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Poll-based view of state changes from now on.
    pub fn watch(&self) -> Subscription<Arc<RootState>> {
        self.state.subscribe()
    }

    // ─── Dispatch ────────────────────────────────────────────────────────

    /// Apply one action.
    ///
    /// On error the state is unchanged and no listener runs. Listeners run
    /// once per accepted action, even when the action changed nothing, and
    /// always receive the latest published state.
    pub fn dispatch(&self, action: impl Into<RootAction>) -> Result<(), ReduceError> {
        let action = action.into();
        let name = action.name();
        let version = {
            let _writer = self.writer.lock();
            let current = self.state.get();
            let next = reduce_root(&current, action).map_err(|err| {
                if err.is_already_started() {
                    debug!(action = name, error = %err, "transition rejected");
                } else {
                    error!(action = name, error = %err, "precondition violated");
                }
                err
            })?;
            if !Arc::ptr_eq(&current, &next) {
                self.state.set(next);
            }
            self.state.version()
        };
        trace!(action = name, version, "dispatched");
        self.listeners.notify_latest(|| self.state.get());
        Ok(())
    }

    // ─── Local Commands ──────────────────────────────────────────────────

    /// Create a post locally, without a server round trip.
    pub fn add_post(&self, new_post: NewPost) -> Result<PostId, WorkflowError> {
        new_post.validate()?;
        let post = Post::prepare(
            new_post.title,
            new_post.content,
            new_post.user,
            self.clock(),
            self.id_generator(),
        );
        let id = post.id.clone();
        self.dispatch(PostsAction::PostAdded(post))?;
        Ok(id)
    }

    /// Edit a post's title and content; its date becomes the current time.
    pub fn update_post(
        &self,
        id: &PostId,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<(), WorkflowError> {
        let (title, content) = (title.into(), content.into());
        require_text("title", &title)?;
        require_text("content", &content)?;
        self.dispatch(PostsAction::post_updated(id.clone(), title, content, self.clock()))?;
        Ok(())
    }

    /// Add one reaction, named by its wire name (`"thumbsUp"`, ...).
    pub fn add_reaction(&self, post_id: &PostId, reaction: &str) -> Result<(), ReduceError> {
        self.dispatch(PostsAction::reaction_added(post_id.clone(), reaction)?)
    }

    /// Mark every held notification as read.
    pub fn mark_all_notifications_read(&self) -> Result<(), ReduceError> {
        self.dispatch(NotificationsAction::AllNotificationsRead)
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("version", &self.state.version())
            .field("listeners", &self.listeners.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Store`].
pub struct StoreBuilder {
    transport: Arc<dyn Transport>,
    config: Option<BulletinConfig>,
    clock: Option<Arc<dyn Clock>>,
    ids: Option<Arc<dyn IdGenerator>>,
    initial_state: Option<RootState>,
}

impl StoreBuilder {
    /// Use `config` instead of the defaults.
    pub fn config(mut self, config: BulletinConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Use `clock` instead of the system clock.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Use `ids` instead of random UUIDs.
    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    /// Start from `state` instead of empty slices.
    pub fn initial_state(mut self, state: RootState) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Finish construction.
    pub fn build(self) -> Store {
        Store {
            state: Dynamic::new(Arc::new(self.initial_state.unwrap_or_default())),
            writer: Mutex::new(()),
            listeners: Listeners::new(),
            selectors: Selectors::new(),
            transport: self.transport,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            ids: self.ids.unwrap_or_else(|| Arc::new(UuidGenerator)),
            config: self.config.unwrap_or_default(),
        }
    }
}
