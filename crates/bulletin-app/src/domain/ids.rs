//! Typed identifiers for domain entities.
//!
//! Ids are opaque strings on the wire. Wrapping them keeps a post id from
//! being passed where a user id is expected.

/// Declare a transparent string id newtype.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone,
            Debug,
            Default,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a raw id string.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the raw id string.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Whether the id is the empty string.
            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        bulletin_core::impl_same_input_by_value!($name);
    };
}

string_id!(
    /// Identifier of a [`Post`](super::Post).
    PostId
);

string_id!(
    /// Identifier of a [`User`](super::User).
    UserId
);

string_id!(
    /// Identifier of a [`Notification`](super::Notification).
    NotificationId
);
