//! Users (post authors).

use super::UserId;
use bulletin_core::{CollectionError, Entity, EntityPatch};
use serde::{Deserialize, Serialize};

/// A user as held in the store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique id.
    pub id: UserId,
    /// Display name.
    pub name: String,
}

impl User {
    /// Build a user.
    pub fn new(id: impl Into<UserId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl Entity for User {
    type Id = UserId;
    type Patch = UserPatch;
    const KIND: &'static str = "user";

    fn id(&self) -> &UserId {
        &self.id
    }
}

/// Partial user record. Fields mirror [`User`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct UserPatch {
    pub id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl From<User> for UserPatch {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: Some(user.name),
        }
    }
}

impl EntityPatch<User> for UserPatch {
    fn id(&self) -> &UserId {
        &self.id
    }

    fn apply_to(self, user: &mut User) {
        if let Some(name) = self.name {
            user.name = name;
        }
    }

    fn into_entity(self) -> Result<User, CollectionError> {
        let name = self
            .name
            .ok_or_else(|| CollectionError::incomplete(User::KIND, &self.id, "name"))?;
        Ok(User { id: self.id, name })
    }
}
