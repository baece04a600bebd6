//! Core error types
//!
//! Errors raised by the collection and operation primitives. Both are
//! contract violations from the caller's point of view: the app layer wraps
//! them into its own precondition error rather than converting them to state.

use crate::operation::OperationStatus;
use thiserror::Error;

/// Errors from [`EntityCollection`](crate::EntityCollection) mutations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CollectionError {
    /// The referenced id is not present in the collection.
    #[error("{kind} '{id}' not found")]
    NotFound {
        /// Entity kind, e.g. `"post"`.
        kind: &'static str,
        /// Requested id.
        id: String,
    },

    /// A record for an unknown id lacks a field required to insert it.
    #[error("cannot insert {kind} '{id}': missing required field '{field}'")]
    IncompleteRecord {
        /// Entity kind.
        kind: &'static str,
        /// Id of the record being inserted.
        id: String,
        /// First missing field.
        field: &'static str,
    },

    /// An in-place modification tried to rewrite the entity's id.
    #[error("{kind} '{id}' cannot change its id to '{attempted}'")]
    IdChanged {
        /// Entity kind.
        kind: &'static str,
        /// Id before the modification.
        id: String,
        /// Id the closure wrote.
        attempted: String,
    },
}

impl CollectionError {
    /// Build a `NotFound` error for the given entity kind.
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// Build an `IncompleteRecord` error for the given entity kind.
    pub fn incomplete(kind: &'static str, id: impl ToString, field: &'static str) -> Self {
        Self::IncompleteRecord {
            kind,
            id: id.to_string(),
            field,
        }
    }
}

/// Errors from [`AsyncOperation`](crate::AsyncOperation) transitions.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OperationError {
    /// `begin` was called on a non-reentrant operation that is still pending.
    #[error("operation '{operation}' is already pending")]
    AlreadyPending {
        /// Operation name.
        operation: &'static str,
    },

    /// `begin_if_idle` was called after the operation had already started.
    #[error("operation '{operation}' already started (status '{status}')")]
    AlreadyStarted {
        /// Operation name.
        operation: &'static str,
        /// Status at the time of the call.
        status: OperationStatus,
    },

    /// `succeed` or `fail` was called while the operation was not pending.
    #[error("operation '{operation}' cannot settle from status '{status}'")]
    NotPending {
        /// Operation name.
        operation: &'static str,
        /// Status at the time of the call.
        status: OperationStatus,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_error_display() {
        let err = CollectionError::not_found("post", "p1");
        assert_eq!(err.to_string(), "post 'p1' not found");

        let err = CollectionError::incomplete("notification", "n1", "date");
        assert!(err.to_string().contains("missing required field 'date'"));
    }

    #[test]
    fn test_operation_error_display() {
        let err = OperationError::NotPending {
            operation: "posts/fetch",
            status: OperationStatus::Idle,
        };
        assert_eq!(
            err.to_string(),
            "operation 'posts/fetch' cannot settle from status 'idle'"
        );
    }
}
