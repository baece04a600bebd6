//! Categorized application errors
//!
//! One error type per layer:
//! - [`ReduceError`]: a reducer precondition was violated (caller bug)
//! - [`TransportError`]: the remote call failed (recorded into tracker state)
//! - [`InputError`]: a command was given invalid user input
//! - [`WorkflowError`]: what an async workflow hands back to its caller
//! - [`ConfigError`]: configuration could not be loaded or applied

use crate::domain::PostId;
use bulletin_core::{CollectionError, OperationError};
use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// Reducer Errors
// ============================================================================

/// A state transition was requested that the current state does not allow.
///
/// These are never converted into state. The store returns them from
/// `dispatch` and leaves the state untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReduceError {
    /// The action references a post that is not in the store.
    #[error("post '{id}' does not exist")]
    UnknownPost {
        /// Requested post id.
        id: PostId,
    },

    /// A reaction name outside the known set.
    #[error("unknown reaction kind '{name}'")]
    UnknownReaction {
        /// Name as received.
        name: String,
    },

    /// Collection-level failure (missing record, incomplete record).
    #[error(transparent)]
    Collection(#[from] CollectionError),

    /// Tracker transition not allowed from its current status.
    #[error(transparent)]
    Operation(#[from] OperationError),
}

impl ReduceError {
    /// Whether a guarded start lost to an earlier one: the operation is
    /// already in flight, or a load-once operation has already run.
    ///
    /// Guarded workflows report this as skipped.
    #[must_use]
    pub fn is_already_started(&self) -> bool {
        matches!(
            self,
            Self::Operation(
                OperationError::AlreadyPending { .. } | OperationError::AlreadyStarted { .. }
            )
        )
    }
}

// ============================================================================
// Transport Errors
// ============================================================================

/// Failure of a remote call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The server answered with a non-success status.
    #[error("request to {path} failed with status {status}")]
    Status {
        /// Request path.
        path: String,
        /// HTTP status code.
        status: u16,
    },

    /// The request never completed.
    #[error("network error calling {path}: {reason}")]
    Network {
        /// Request path.
        path: String,
        /// Underlying failure.
        reason: String,
    },

    /// The response could not be decoded into the expected shape.
    #[error("malformed response from {path}: {reason}")]
    Decode {
        /// Request path.
        path: String,
        /// What did not match.
        reason: String,
    },

    /// The server refused the request.
    #[error("request to {path} was rejected: {reason}")]
    Rejected {
        /// Request path.
        path: String,
        /// Server-provided reason.
        reason: String,
    },
}

impl TransportError {
    /// Request path the error refers to.
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::Status { path, .. }
            | Self::Network { path, .. }
            | Self::Decode { path, .. }
            | Self::Rejected { path, .. } => path,
        }
    }
}

// ============================================================================
// Input Errors
// ============================================================================

/// User input rejected before a command runs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InputError {
    /// A required field was empty or whitespace.
    #[error("{field} must not be empty")]
    Empty {
        /// Field name, e.g. `"title"`.
        field: &'static str,
    },
}

// ============================================================================
// Workflow Errors
// ============================================================================

/// Error returned by an async workflow.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    /// The store refused a transition.
    #[error("precondition violated: {0}")]
    Precondition(#[from] ReduceError),

    /// The remote call failed. Only unwrapping workflows return this; the
    /// failure has already been recorded in the tracker.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The command input was invalid; nothing was dispatched.
    #[error("invalid input: {0}")]
    Input(#[from] InputError),
}

impl WorkflowError {
    /// Whether the caller can reasonably retry or correct and resubmit.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Input(_))
    }
}

// ============================================================================
// Configuration Errors
// ============================================================================

/// Failure to load or apply configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file {}: {source}", path.display())]
    Io {
        /// File that was requested.
        path: PathBuf,
        /// I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML for [`BulletinConfig`](crate::BulletinConfig).
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value parsed but failed validation.
    #[error("invalid config value for {field}: {reason}")]
    Invalid {
        /// Config key.
        field: &'static str,
        /// Why the value was refused.
        reason: String,
    },

    /// The log filter is invalid or a global subscriber is already set.
    #[error("failed to install log subscriber: {0}")]
    Logging(String),
}
