//! Posts and reactions.

use super::{PostId, UserId};
use crate::errors::{InputError, ReduceError};
use bulletin_core::{Clock, CollectionError, Entity, EntityPatch, IdGenerator};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Characters of content shown in list views before truncation.
pub const EXCERPT_LEN: usize = 40;

// ─── Reactions ───────────────────────────────────────────────────────────────

/// The closed set of reactions a reader can leave on a post.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReactionKind {
    /// 👍
    ThumbsUp,
    /// 🎉
    Hooray,
    /// ❤️
    Heart,
    /// 🚀
    Rocket,
    /// 👀
    Eyes,
}

impl ReactionKind {
    /// Every kind, in display order.
    pub const ALL: [ReactionKind; 5] = [
        Self::ThumbsUp,
        Self::Hooray,
        Self::Heart,
        Self::Rocket,
        Self::Eyes,
    ];

    /// Wire name (`thumbsUp`, `hooray`, ...).
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::ThumbsUp => "thumbsUp",
            Self::Hooray => "hooray",
            Self::Heart => "heart",
            Self::Rocket => "rocket",
            Self::Eyes => "eyes",
        }
    }

    /// Emoji shown on the reaction button.
    #[must_use]
    pub fn emoji(&self) -> &'static str {
        match self {
            Self::ThumbsUp => "👍",
            Self::Hooray => "🎉",
            Self::Heart => "❤️",
            Self::Rocket => "🚀",
            Self::Eyes => "👀",
        }
    }
}

impl fmt::Display for ReactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ReactionKind {
    type Err = ReduceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| ReduceError::UnknownReaction {
                name: s.to_string(),
            })
    }
}

/// Per-kind reaction counters. Missing kinds deserialize as zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Reactions {
    /// 👍
    pub thumbs_up: u32,
    /// 🎉
    pub hooray: u32,
    /// ❤️
    pub heart: u32,
    /// 🚀
    pub rocket: u32,
    /// 👀
    pub eyes: u32,
}

impl Reactions {
    /// Counter for one kind.
    #[must_use]
    pub fn count(&self, kind: ReactionKind) -> u32 {
        match kind {
            ReactionKind::ThumbsUp => self.thumbs_up,
            ReactionKind::Hooray => self.hooray,
            ReactionKind::Heart => self.heart,
            ReactionKind::Rocket => self.rocket,
            ReactionKind::Eyes => self.eyes,
        }
    }

    /// Increment one kind by exactly one.
    pub fn increment(&mut self, kind: ReactionKind) {
        let counter = match kind {
            ReactionKind::ThumbsUp => &mut self.thumbs_up,
            ReactionKind::Hooray => &mut self.hooray,
            ReactionKind::Heart => &mut self.heart,
            ReactionKind::Rocket => &mut self.rocket,
            ReactionKind::Eyes => &mut self.eyes,
        };
        *counter = counter.saturating_add(1);
    }

    /// Sum over all kinds.
    #[must_use]
    pub fn total(&self) -> u64 {
        ReactionKind::ALL
            .into_iter()
            .map(|kind| u64::from(self.count(kind)))
            .sum()
    }
}

// ─── Post ────────────────────────────────────────────────────────────────────

/// A post as held in the store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Unique id, assigned by the server or the id generator.
    pub id: PostId,
    /// Headline.
    pub title: String,
    /// Body text.
    pub content: String,
    /// Creation time, or time of the last edit.
    pub date: DateTime<Utc>,
    /// Author.
    pub user: UserId,
    /// Reaction counters; absent on the wire means all zero.
    #[serde(default)]
    pub reactions: Reactions,
}

impl Post {
    /// A fresh post: new id, current time, no reactions.
    pub fn prepare(
        title: impl Into<String>,
        content: impl Into<String>,
        user: impl Into<UserId>,
        clock: &dyn Clock,
        ids: &dyn IdGenerator,
    ) -> Self {
        Self {
            id: PostId::new(ids.next_id()),
            title: title.into(),
            content: content.into(),
            date: clock.now(),
            user: user.into(),
            reactions: Reactions::default(),
        }
    }

    /// Sort order of the posts collection: newest first.
    pub fn newest_first(a: &Post, b: &Post) -> Ordering {
        b.date.cmp(&a.date)
    }

    /// Content truncated to [`EXCERPT_LEN`] characters, with `...` appended
    /// when something was cut.
    #[must_use]
    pub fn excerpt(&self) -> String {
        let mut chars = self.content.chars();
        let head: String = chars.by_ref().take(EXCERPT_LEN).collect();
        if chars.next().is_some() {
            format!("{head}...")
        } else {
            head
        }
    }
}

impl Entity for Post {
    type Id = PostId;
    type Patch = PostPatch;
    const KIND: &'static str = "post";

    fn id(&self) -> &PostId {
        &self.id
    }
}

/// Partial post record, as delivered by the server.
///
/// Present fields overwrite, absent fields keep their current value. Fields
/// mirror [`Post`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct PostPatch {
    pub id: PostId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reactions: Option<Reactions>,
}

impl From<Post> for PostPatch {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            title: Some(post.title),
            content: Some(post.content),
            date: Some(post.date),
            user: Some(post.user),
            reactions: Some(post.reactions),
        }
    }
}

impl EntityPatch<Post> for PostPatch {
    fn id(&self) -> &PostId {
        &self.id
    }

    fn apply_to(self, post: &mut Post) {
        if let Some(title) = self.title {
            post.title = title;
        }
        if let Some(content) = self.content {
            post.content = content;
        }
        if let Some(date) = self.date {
            post.date = date;
        }
        if let Some(user) = self.user {
            post.user = user;
        }
        if let Some(reactions) = self.reactions {
            post.reactions = reactions;
        }
    }

    fn into_entity(self) -> Result<Post, CollectionError> {
        let missing = |field| CollectionError::incomplete(Post::KIND, &self.id, field);
        let title = self.title.ok_or_else(|| missing("title"))?;
        let content = self.content.ok_or_else(|| missing("content"))?;
        let date = self.date.ok_or_else(|| missing("date"))?;
        let user = self.user.ok_or_else(|| missing("user"))?;
        Ok(Post {
            id: self.id,
            title,
            content,
            date,
            user,
            reactions: self.reactions.unwrap_or_default(),
        })
    }
}

// ─── Commands ────────────────────────────────────────────────────────────────

/// Input for creating a post on the server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    /// Headline; must not be blank.
    pub title: String,
    /// Body text; must not be blank.
    pub content: String,
    /// Author; must not be blank.
    pub user: UserId,
}

impl NewPost {
    /// Build a new-post command.
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        user: impl Into<UserId>,
    ) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            user: user.into(),
        }
    }

    /// Title, content and author must all be non-empty.
    pub fn validate(&self) -> Result<(), InputError> {
        require_text("title", &self.title)?;
        require_text("content", &self.content)?;
        require_text("user", self.user.as_str())
    }
}

/// Reject empty or whitespace-only input.
pub(crate) fn require_text(field: &'static str, value: &str) -> Result<(), InputError> {
    if value.trim().is_empty() {
        Err(InputError::Empty { field })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn post(content: &str) -> Post {
        Post {
            id: "p1".into(),
            title: "Title".into(),
            content: content.into(),
            date: ts("2024-01-01T00:00:00Z"),
            user: "u1".into(),
            reactions: Reactions::default(),
        }
    }

    #[test]
    fn test_reaction_emoji() {
        let emoji: Vec<&str> = ReactionKind::ALL.iter().map(ReactionKind::emoji).collect();
        assert_eq!(emoji, ["👍", "🎉", "❤️", "🚀", "👀"]);
    }

    #[test]
    fn test_reaction_kind_parsing() {
        assert_eq!("thumbsUp".parse::<ReactionKind>().unwrap(), ReactionKind::ThumbsUp);
        assert_eq!("eyes".parse::<ReactionKind>().unwrap(), ReactionKind::Eyes);
        assert_eq!(
            "like".parse::<ReactionKind>(),
            Err(ReduceError::UnknownReaction { name: "like".into() })
        );
    }

    #[test]
    fn test_increment_touches_one_counter() {
        let mut reactions = Reactions::default();
        reactions.increment(ReactionKind::Rocket);
        reactions.increment(ReactionKind::Rocket);
        assert_eq!(reactions.count(ReactionKind::Rocket), 2);
        for kind in ReactionKind::ALL {
            if kind != ReactionKind::Rocket {
                assert_eq!(reactions.count(kind), 0);
            }
        }
        assert_eq!(reactions.total(), 2);
    }

    #[test]
    fn test_reactions_wire_names() {
        let json = serde_json::to_value(Reactions::default()).unwrap();
        assert_eq!(json["thumbsUp"], 0);
        let partial: Reactions = serde_json::from_str(r#"{"heart": 3}"#).unwrap();
        assert_eq!(partial.heart, 3);
        assert_eq!(partial.thumbs_up, 0);
    }

    #[test]
    fn test_excerpt() {
        assert_eq!(post("short").excerpt(), "short");
        let exact = "x".repeat(EXCERPT_LEN);
        assert_eq!(post(&exact).excerpt(), exact);
        let long = "y".repeat(EXCERPT_LEN + 5);
        assert_eq!(post(&long).excerpt(), format!("{}...", "y".repeat(EXCERPT_LEN)));
    }

    #[test]
    fn test_patch_merges_present_fields_only() {
        let mut target = post("body");
        PostPatch {
            id: "p1".into(),
            title: Some("New".into()),
            ..PostPatch::default()
        }
        .apply_to(&mut target);
        assert_eq!(target.title, "New");
        assert_eq!(target.content, "body");
    }

    #[test]
    fn test_incomplete_patch_cannot_become_post() {
        let patch = PostPatch {
            id: "p9".into(),
            title: Some("t".into()),
            ..PostPatch::default()
        };
        assert!(matches!(
            patch.into_entity(),
            Err(CollectionError::IncompleteRecord { field: "content", .. })
        ));
    }

    #[test]
    fn test_post_deserializes_without_reactions() {
        let post: Post = serde_json::from_str(
            r#"{"id":"p1","title":"t","content":"c","date":"2024-01-01T00:00:00Z","user":"u1"}"#,
        )
        .unwrap();
        assert_eq!(post.reactions, Reactions::default());
    }

    #[test]
    fn test_new_post_validation() {
        assert!(NewPost::new("t", "c", "u1").validate().is_ok());
        assert_eq!(
            NewPost::new(" ", "c", "u1").validate(),
            Err(InputError::Empty { field: "title" })
        );
        assert_eq!(
            NewPost::new("t", "c", "").validate(),
            Err(InputError::Empty { field: "user" })
        );
    }
}
