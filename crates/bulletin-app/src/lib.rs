//! # Bulletin App - Headless Application Core
//!
//! The bulletin domain on top of `bulletin-core`: posts with reactions, an
//! author directory, and incrementally fetched notifications.
//!
//! ## Architecture
//!
//! ```text
//! frontend ──dispatch / workflows──► Store ──reduce_root──► slices
//!     ▲                                │
//!     └──── selectors / listeners ◄────┘
//!                                      │
//!                      workflows ──► Transport (injected)
//! ```
//!
//! - [`slices`]: pure reducers, one per entity kind
//! - [`store`]: root state, action routing, the single-writer [`Store`]
//! - [`selectors`]: plain and memoized read projections
//! - [`workflows`]: async commands that drive tracked remote operations
//! - [`transport`]: the I/O boundary frontends implement
//!
//! ## Usage
//!
//! ```rust,ignore
//! let store = Store::builder(Arc::new(HttpTransport::new(base_url)))
//!     .config(BulletinConfig::load_from_file("bulletin.toml")?)
//!     .build();
//!
//! workflows::bootstrap(&store).await?;
//! workflows::fetch_posts(&store).await?;
//! let posts = store.selectors().all_posts(&store.state());
//! ```

#![forbid(unsafe_code)]

/// Configuration loading and API paths
pub mod config;

/// Domain entities
pub mod domain;

/// Error types
pub mod errors;

/// Log subscriber installation
pub mod logging;

/// Read projections
pub mod selectors;

/// Collection slices and reducers
pub mod slices;

/// Root state and the store
pub mod store;

/// Remote API boundary
pub mod transport;

/// Async commands
pub mod workflows;

pub use config::BulletinConfig;
pub use domain::{
    NewPost, Notification, NotificationId, NotificationPatch, Post, PostId, PostPatch,
    ReactionKind, Reactions, User, UserId, UserPatch,
};
pub use errors::{ConfigError, InputError, ReduceError, TransportError, WorkflowError};
pub use selectors::Selectors;
pub use slices::{
    NotificationsAction, NotificationsState, PostsAction, PostsState, Slice, UsersAction,
    UsersState,
};
pub use store::{reduce_root, RootAction, RootState, Store, StoreBuilder};
pub use transport::Transport;
pub use workflows::FetchOutcome;
