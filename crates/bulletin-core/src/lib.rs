//! Bulletin Core - Normalized State Primitives
//!
//! This crate provides the domain-agnostic building blocks of the Bulletin
//! application state container. It knows nothing about posts, users or
//! notifications; `bulletin-app` instantiates these primitives once per
//! entity kind.
//!
//! # Building Blocks
//!
//! - [`EntityCollection`]: keyed, ordered, normalized container for one entity type
//! - [`AsyncOperation`]: idle → pending → succeeded | failed lifecycle tracker
//! - [`Lifecycle`]: the event carried into a slice when a tracked operation moves
//! - [`Memo`] / [`KeyedMemo`]: identity-keyed caches for derived views
//! - [`Dynamic`] / [`Listeners`]: versioned state cell and push notification registry
//! - [`Clock`] / [`IdGenerator`]: injected effects for action preparation
//!
//! ## Invariants
//!
//! 1. **Normalized**: every id in a collection maps to exactly one entity
//! 2. **Ordered**: a sorted collection is in comparator order after every mutation
//! 3. **Stable ids**: mutating an entity never changes its id
//! 4. **Identity memoization**: cached views are invalidated by `Arc` identity, not deep equality

#![forbid(unsafe_code)]

/// Normalized entity collections
pub mod collection;

/// Effect traits for time and id generation
pub mod effects;

/// Error types
pub mod errors;

/// Identity-keyed memoization
pub mod memo;

/// Async operation lifecycle tracking
pub mod operation;

/// Versioned state cell and listener registry
pub mod reactive;

pub use collection::{Entity, EntityCollection, EntityPatch, SortComparer};
pub use effects::{Clock, IdGenerator, SystemClock, UuidGenerator};
pub use errors::{CollectionError, OperationError};
pub use memo::{KeyedMemo, Memo, SameInput};
pub use operation::{AsyncOperation, Lifecycle, OperationStatus, Reentrancy};
pub use reactive::{Dynamic, ListenerId, Listeners, Subscription};
