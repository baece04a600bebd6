//! Effect traits for action preparation.
//!
//! Reducers are pure, so anything non-deterministic an action needs (a fresh
//! id, the current time) is read from these effects when the action is
//! *prepared*, before it reaches a reducer. Production code uses
//! [`SystemClock`] and [`UuidGenerator`]; tests inject deterministic handlers.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Wall-clock time source.
pub trait Clock: Send + Sync {
    /// Current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Source of fresh, globally unique entity ids.
pub trait IdGenerator: Send + Sync {
    /// Produce a new id. Never returns the same id twice.
    fn next_id(&self) -> String;
}

/// Production clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Production id generator producing random (v4) UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}
