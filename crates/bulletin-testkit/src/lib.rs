//! Bulletin Testing Infrastructure
//!
//! Deterministic stand-ins for everything the store takes from outside:
//! the remote API, the clock and the id generator, plus entity fixtures.
//!
//! # Usage
//!
//! ```rust,ignore
//! use bulletin_testkit::*;
//!
//! #[tokio::test]
//! async fn loads_posts() {
//!     let seeded = FakeApi::new().with_posts(vec![post("p1", "u1", "2024-01-01T00:00:00Z")]);
//!     let api = Arc::new(seeded);
//!     let store = test_store(api.clone());
//!     workflows::fetch_posts(&store).await.unwrap();
//! }
//! ```

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

pub mod clock;
pub mod fake_api;
pub mod fixtures;
pub mod scripted;

pub use clock::{FixedClock, SequentialIds};
pub use fake_api::{FakeApi, Request};
pub use fixtures::*;
pub use scripted::{DeferredReply, ScriptedTransport};

use bulletin_app::{Store, Transport};
use std::sync::Arc;

/// Default start time of [`test_store`]'s clock.
pub const TEST_EPOCH: &str = "2024-06-01T09:00:00Z";

/// A store over `transport` with a [`FixedClock`] at [`TEST_EPOCH`] and
/// [`SequentialIds`] prefixed `post`.
pub fn test_store(transport: Arc<dyn Transport>) -> Store {
    Store::builder(transport)
        .clock(Arc::new(FixedClock::at(TEST_EPOCH)))
        .id_generator(Arc::new(SequentialIds::new("post")))
        .build()
}

/// Install a test-writer log subscriber. Safe to call from every test.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .try_init();
}
