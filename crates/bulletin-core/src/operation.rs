//! # Async Operation Tracking
//!
//! [`AsyncOperation`] models one named asynchronous unit of work (e.g. "fetch
//! posts") as a small state machine:
//!
//! ```text
//! idle ──begin──► pending ──succeed──► succeeded
//!   ▲               │                     │
//!   │               └────fail──► failed   │
//!   │                              │      │
//!   └──────── begin (from any settled status) ◄┘
//! ```
//!
//! The tracker stores no payload. The owning slice receives the payload in the
//! same transition as the status change, through a [`Lifecycle`] event.
//!
//! [`AsyncOperation::begin_if_idle`] starts only from `idle`.
//!
//! `begin` while pending is governed by [`Reentrancy`]: non-reentrant
//! operations reject it, stacking operations count in-flight calls and let the
//! last completion decide the final status.

use crate::errors::OperationError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a tracked operation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationStatus {
    /// Never started.
    #[default]
    Idle,
    /// Started and not yet settled.
    Pending,
    /// Last run completed successfully.
    Succeeded,
    /// Last run failed; an error message is recorded.
    Failed,
}

impl OperationStatus {
    /// Lowercase label for logging and display.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Pending => "pending",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }

    /// Whether the operation has never started.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Whether the operation is in flight.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Whether the last run finished, successfully or not.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Policy for `begin` while an operation is already pending.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub enum Reentrancy {
    /// A second `begin` is rejected with [`OperationError::AlreadyPending`].
    #[default]
    Reject,
    /// Calls stack; the operation stays pending until every call has settled,
    /// and the last completion decides the final status.
    Stack,
}

/// Lifecycle event for a tracked operation, carrying the payload on success.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Lifecycle<T> {
    /// The remote call is about to start.
    Pending,
    /// The remote call resolved with a payload.
    Fulfilled(T),
    /// The remote call failed with a human-readable message.
    Rejected(String),
}

impl<T> Lifecycle<T> {
    /// Short tag for logging.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Fulfilled(_) => "fulfilled",
            Self::Rejected(_) => "rejected",
        }
    }
}

/// Lifecycle tracker for one named asynchronous operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AsyncOperation {
    name: &'static str,
    status: OperationStatus,
    error: Option<String>,
    in_flight: u32,
    reentrancy: Reentrancy,
}

impl AsyncOperation {
    /// Create an idle, non-reentrant operation.
    pub fn new(name: &'static str) -> Self {
        Self::with_reentrancy(name, Reentrancy::Reject)
    }

    /// Create an idle operation with an explicit reentrancy policy.
    pub fn with_reentrancy(name: &'static str, reentrancy: Reentrancy) -> Self {
        Self {
            name,
            status: OperationStatus::Idle,
            error: None,
            in_flight: 0,
            reentrancy,
        }
    }

    /// Operation name (e.g. `"posts/fetchPosts"`).
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Current status.
    pub fn status(&self) -> OperationStatus {
        self.status
    }

    /// Last recorded error message, if the operation is failed.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Number of calls currently in flight.
    pub fn in_flight(&self) -> u32 {
        self.in_flight
    }

    /// Reentrancy policy.
    pub fn reentrancy(&self) -> Reentrancy {
        self.reentrancy
    }

    /// Transition to `pending` and clear any previous error.
    pub fn begin(&mut self) -> Result<(), OperationError> {
        if self.status.is_pending() && self.reentrancy == Reentrancy::Reject {
            return Err(OperationError::AlreadyPending {
                operation: self.name,
            });
        }
        self.status = OperationStatus::Pending;
        self.error = None;
        self.in_flight += 1;
        Ok(())
    }

    /// Transition to `pending` only if the operation has never started.
    ///
    /// Used for load-once operations: the status check and the transition
    /// happen in one step, so of two racing callers exactly one starts.
    pub fn begin_if_idle(&mut self) -> Result<(), OperationError> {
        if !self.status.is_idle() {
            return Err(OperationError::AlreadyStarted {
                operation: self.name,
                status: self.status,
            });
        }
        self.begin()
    }

    /// Settle one in-flight call successfully.
    pub fn succeed(&mut self) -> Result<(), OperationError> {
        self.settle(None)
    }

    /// Settle one in-flight call with a failure message.
    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), OperationError> {
        self.settle(Some(message.into()))
    }

    fn settle(&mut self, error: Option<String>) -> Result<(), OperationError> {
        if !self.status.is_pending() || self.in_flight == 0 {
            return Err(OperationError::NotPending {
                operation: self.name,
                status: self.status,
            });
        }
        self.in_flight -= 1;
        // Last completion wins: the error reflects the most recent outcome.
        self.error = error;
        if self.in_flight == 0 {
            self.status = if self.error.is_some() {
                OperationStatus::Failed
            } else {
                OperationStatus::Succeeded
            };
        }
        Ok(())
    }
}
