//! Posts slice
//!
//! Holds the posts collection (newest first) and two trackers:
//! - `posts/fetchPosts`: non-reentrant, drives the list load; the first load
//!   starts through `FetchPostsIfIdle` so only one caller ever runs it
//! - `posts/addNewPost`: stacking, so several saves may be in flight

use super::Slice;
use crate::domain::{Post, PostId, PostPatch, ReactionKind, UserId};
use crate::errors::ReduceError;
use bulletin_core::{
    AsyncOperation, Clock, EntityCollection, IdGenerator, Lifecycle, OperationStatus, Reentrancy,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Tracker name for the posts list fetch.
pub const FETCH_POSTS: &str = "posts/fetchPosts";
/// Tracker name for server-side post creation.
pub const ADD_NEW_POST: &str = "posts/addNewPost";

/// State of the posts slice.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PostsState {
    posts: Arc<EntityCollection<Post>>,
    fetch: AsyncOperation,
    add: AsyncOperation,
}

impl Default for PostsState {
    fn default() -> Self {
        Self {
            posts: Arc::new(EntityCollection::sorted_by(Post::newest_first)),
            fetch: AsyncOperation::new(FETCH_POSTS),
            add: AsyncOperation::with_reentrancy(ADD_NEW_POST, Reentrancy::Stack),
        }
    }
}

impl PostsState {
    /// Initial state holding `posts`, with both trackers idle.
    pub fn with_posts(posts: impl IntoIterator<Item = Post>) -> Self {
        let mut collection = EntityCollection::sorted_by(Post::newest_first);
        collection.set_all(posts);
        Self {
            posts: Arc::new(collection),
            ..Self::default()
        }
    }

    /// The posts collection.
    pub fn posts(&self) -> &Arc<EntityCollection<Post>> {
        &self.posts
    }

    /// Tracker for the list fetch.
    pub fn fetch(&self) -> &AsyncOperation {
        &self.fetch
    }

    /// Tracker for post creation.
    pub fn add(&self) -> &AsyncOperation {
        &self.add
    }

    /// Status of the list fetch.
    pub fn status(&self) -> OperationStatus {
        self.fetch.status()
    }

    /// Error of the last failed list fetch.
    pub fn error(&self) -> Option<&str> {
        self.fetch.error()
    }
}

/// Actions handled by [`PostsState`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PostsAction {
    /// Insert a locally created post.
    PostAdded(Post),
    /// Replace title and content of an existing post and restamp it.
    PostUpdated {
        /// Post to edit.
        id: PostId,
        /// New title.
        title: String,
        /// New content.
        content: String,
        /// Edit time; the post moves to this position in the list.
        date: DateTime<Utc>,
    },
    /// Increment one reaction counter on a post.
    ReactionAdded {
        /// Post reacted to.
        post_id: PostId,
        /// Counter to increment.
        reaction: ReactionKind,
    },
    /// Start the list fetch only if it has never been started.
    ///
    /// Settled through `FetchPosts` like any other run.
    FetchPostsIfIdle,
    /// Lifecycle of the posts list fetch.
    FetchPosts(Lifecycle<Vec<PostPatch>>),
    /// Lifecycle of server-side post creation.
    AddNewPost(Lifecycle<Post>),
}

impl PostsAction {
    /// Prepare a `PostAdded` action with a fresh id and the current time.
    pub fn post_added(
        title: impl Into<String>,
        content: impl Into<String>,
        user: impl Into<UserId>,
        clock: &dyn Clock,
        ids: &dyn IdGenerator,
    ) -> Self {
        Self::PostAdded(Post::prepare(title, content, user, clock, ids))
    }

    /// Prepare a `PostUpdated` action stamped with the current time.
    pub fn post_updated(
        id: impl Into<PostId>,
        title: impl Into<String>,
        content: impl Into<String>,
        clock: &dyn Clock,
    ) -> Self {
        Self::PostUpdated {
            id: id.into(),
            title: title.into(),
            content: content.into(),
            date: clock.now(),
        }
    }

    /// Prepare a `ReactionAdded` action from a wire reaction name.
    pub fn reaction_added(post_id: impl Into<PostId>, reaction: &str) -> Result<Self, ReduceError> {
        Ok(Self::ReactionAdded {
            post_id: post_id.into(),
            reaction: reaction.parse()?,
        })
    }

    /// Action tag, e.g. `"posts/reactionAdded"`.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::PostAdded(_) => "posts/postAdded",
            Self::PostUpdated { .. } => "posts/postUpdated",
            Self::ReactionAdded { .. } => "posts/reactionAdded",
            Self::FetchPostsIfIdle => "posts/fetchPosts/pendingIfIdle",
            Self::FetchPosts(Lifecycle::Pending) => "posts/fetchPosts/pending",
            Self::FetchPosts(Lifecycle::Fulfilled(_)) => "posts/fetchPosts/fulfilled",
            Self::FetchPosts(Lifecycle::Rejected(_)) => "posts/fetchPosts/rejected",
            Self::AddNewPost(Lifecycle::Pending) => "posts/addNewPost/pending",
            Self::AddNewPost(Lifecycle::Fulfilled(_)) => "posts/addNewPost/fulfilled",
            Self::AddNewPost(Lifecycle::Rejected(_)) => "posts/addNewPost/rejected",
        }
    }
}

impl Slice for PostsState {
    type Action = PostsAction;
    const NAME: &'static str = "posts";

    fn reduce(state: &Arc<Self>, action: PostsAction) -> Result<Arc<Self>, ReduceError> {
        let mut next = PostsState::clone(state);
        match action {
            PostsAction::PostAdded(post) => {
                if state.posts.contains(&post.id) {
                    return Ok(Arc::clone(state));
                }
                Arc::make_mut(&mut next.posts).add_one(post);
            }
            PostsAction::PostUpdated {
                id,
                title,
                content,
                date,
            } => {
                if !state.posts.contains(&id) {
                    return Err(ReduceError::UnknownPost { id });
                }
                Arc::make_mut(&mut next.posts).modify_one(&id, |post| {
                    post.title = title;
                    post.content = content;
                    post.date = date;
                })?;
            }
            PostsAction::ReactionAdded { post_id, reaction } => {
                if !state.posts.contains(&post_id) {
                    return Err(ReduceError::UnknownPost { id: post_id });
                }
                Arc::make_mut(&mut next.posts)
                    .modify_one(&post_id, |post| post.reactions.increment(reaction))?;
            }
            PostsAction::FetchPostsIfIdle => next.fetch.begin_if_idle()?,
            PostsAction::FetchPosts(Lifecycle::Pending) => next.fetch.begin()?,
            PostsAction::FetchPosts(Lifecycle::Fulfilled(records)) => {
                next.fetch.succeed()?;
                let mut posts = EntityCollection::clone(&state.posts);
                if posts.upsert_many(records)? > 0 {
                    next.posts = Arc::new(posts);
                }
            }
            PostsAction::FetchPosts(Lifecycle::Rejected(message)) => next.fetch.fail(message)?,
            PostsAction::AddNewPost(Lifecycle::Pending) => next.add.begin()?,
            PostsAction::AddNewPost(Lifecycle::Fulfilled(post)) => {
                next.add.succeed()?;
                if !state.posts.contains(&post.id) {
                    Arc::make_mut(&mut next.posts).add_one(post);
                }
            }
            PostsAction::AddNewPost(Lifecycle::Rejected(message)) => next.add.fail(message)?,
        }
        Ok(Arc::new(next))
    }
}
