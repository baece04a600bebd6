//! # Selector Layer
//!
//! Read-only projections of [`RootState`].
//!
//! Plain lookups are free functions. Projections that allocate (lists,
//! filtered lists, counts over a collection) go through [`Selectors`], which
//! caches each result keyed by the `Arc` identity of the collection it was
//! computed from. Two calls against the same collection return the same
//! `Arc`, so views can skip re-rendering by pointer comparison.

use crate::domain::{Notification, Post, PostId, User, UserId};
use crate::store::RootState;
use bulletin_core::{EntityCollection, KeyedMemo, Memo, OperationStatus};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Author label for posts whose user is not loaded.
pub const UNKNOWN_AUTHOR: &str = "Unknown author";
/// Author label for notifications whose user is not loaded.
pub const UNKNOWN_USER: &str = "Unknown user";

// ─── Plain Selectors ─────────────────────────────────────────────────────────

/// Post with the given id.
pub fn select_post_by_id(state: &RootState, id: &PostId) -> Option<Arc<Post>> {
    state.posts.posts().get(id).cloned()
}

/// User with the given id.
pub fn select_user_by_id(state: &RootState, id: &UserId) -> Option<Arc<User>> {
    state.users.users().get(id).cloned()
}

/// Status of the posts list fetch.
pub fn select_posts_status(state: &RootState) -> OperationStatus {
    state.posts.status()
}

/// Error of the last failed posts list fetch.
pub fn select_posts_error(state: &RootState) -> Option<&str> {
    state.posts.error()
}

/// Display name of a post's author, or [`UNKNOWN_AUTHOR`].
pub fn select_post_author_name(state: &RootState, post: &Post) -> String {
    select_user_by_id(state, &post.user)
        .map_or_else(|| UNKNOWN_AUTHOR.to_string(), |user| user.name.clone())
}

/// Display name of the user a notification is about, or [`UNKNOWN_USER`].
pub fn select_notification_author_name(state: &RootState, notification: &Notification) -> String {
    select_user_by_id(state, &notification.user)
        .map_or_else(|| UNKNOWN_USER.to_string(), |user| user.name.clone())
}

/// Date of the newest held notification.
pub fn select_latest_notification_date(state: &RootState) -> Option<DateTime<Utc>> {
    state.notifications.latest_timestamp()
}

// ─── Memoized Selectors ──────────────────────────────────────────────────────

type PostList = Arc<[Arc<Post>]>;

/// Memoized projections, owned by one store.
pub struct Selectors {
    all_posts: Memo<Arc<EntityCollection<Post>>, PostList>,
    post_ids: Memo<Arc<EntityCollection<Post>>, Arc<[PostId]>>,
    posts_by_user: KeyedMemo<UserId, PostList, PostList>,
    all_users: Memo<Arc<EntityCollection<User>>, Arc<[Arc<User>]>>,
    all_notifications: Memo<Arc<EntityCollection<Notification>>, Arc<[Arc<Notification>]>>,
    unread_notifications: Memo<Arc<EntityCollection<Notification>>, usize>,
}

impl Selectors {
    /// Create a set of empty caches.
    pub fn new() -> Self {
        Self {
            all_posts: Memo::new("all_posts"),
            post_ids: Memo::new("post_ids"),
            posts_by_user: KeyedMemo::new("posts_by_user"),
            all_users: Memo::new("all_users"),
            all_notifications: Memo::new("all_notifications"),
            unread_notifications: Memo::new("unread_notification_count"),
        }
    }

    /// Every post, newest first.
    pub fn all_posts(&self, state: &RootState) -> PostList {
        self.all_posts
            .get(Arc::clone(state.posts.posts()), |posts| posts.iter().cloned().collect())
    }

    /// Ids of every post, newest first.
    pub fn post_ids(&self, state: &RootState) -> Arc<[PostId]> {
        self.post_ids
            .get(Arc::clone(state.posts.posts()), |posts| posts.ids().cloned().collect())
    }

    /// Posts written by `user`, newest first.
    ///
    /// Derived from [`all_posts`](Self::all_posts), so it is recomputed only
    /// when the posts collection changes, and each user keeps its own slot.
    pub fn posts_by_user(&self, state: &RootState, user: &UserId) -> PostList {
        let posts = self.all_posts(state);
        self.posts_by_user.get(user, posts, |posts, user| {
            posts.iter().filter(|post| &post.user == user).cloned().collect()
        })
    }

    /// Every user, in server order.
    pub fn all_users(&self, state: &RootState) -> Arc<[Arc<User>]> {
        self.all_users
            .get(Arc::clone(state.users.users()), |users| users.iter().cloned().collect())
    }

    /// Every notification, newest first.
    pub fn all_notifications(&self, state: &RootState) -> Arc<[Arc<Notification>]> {
        self.all_notifications.get(
            Arc::clone(state.notifications.notifications()),
            |notifications| notifications.iter().cloned().collect(),
        )
    }

    /// Number of notifications not yet marked read.
    pub fn unread_notification_count(&self, state: &RootState) -> usize {
        self.unread_notifications.get(
            Arc::clone(state.notifications.notifications()),
            |notifications| notifications.iter().filter(|n| !n.read).count(),
        )
    }

    /// Total recomputations across all caches.
    pub fn recomputations(&self) -> u64 {
        self.all_posts.recomputations()
            + self.post_ids.recomputations()
            + self.posts_by_user.recomputations()
            + self.all_users.recomputations()
            + self.all_notifications.recomputations()
            + self.unread_notifications.recomputations()
    }

    /// Recomputations of the posts-by-user cache, across all users.
    pub fn posts_by_user_recomputations(&self) -> u64 {
        self.posts_by_user.recomputations()
    }
}

impl Default for Selectors {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Selectors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Selectors")
            .field("recomputations", &self.recomputations())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Reactions;
    use crate::slices::{NotificationsState, PostsAction, PostsState, Slice, UsersState};

    fn post(id: &str, user: &str, date: &str) -> Post {
        Post {
            id: id.into(),
            title: id.to_uppercase(),
            content: String::new(),
            date: date.parse().unwrap(),
            user: user.into(),
            reactions: Reactions::default(),
        }
    }

    fn root(posts: Vec<Post>) -> RootState {
        RootState {
            posts: Arc::new(PostsState::with_posts(posts)),
            users: Arc::new(UsersState::with_users([User::new("u1", "Ann")])),
            notifications: Arc::new(NotificationsState::default()),
        }
    }

    #[test]
    fn test_author_name_fallbacks() {
        let state = root(vec![]);
        let known = post("p1", "u1", "2024-01-01T00:00:00Z");
        let orphan = post("p2", "ghost", "2024-01-01T00:00:00Z");
        assert_eq!(select_post_author_name(&state, &known), "Ann");
        assert_eq!(select_post_author_name(&state, &orphan), UNKNOWN_AUTHOR);

        let notification = Notification {
            id: "n1".into(),
            date: "2024-01-01T00:00:00Z".parse().unwrap(),
            user: "ghost".into(),
            message: "hello".into(),
            read: false,
            is_new: true,
        };
        assert_eq!(select_notification_author_name(&state, &notification), UNKNOWN_USER);
    }

    #[test]
    fn test_all_posts_is_cached_by_collection_identity() {
        let selectors = Selectors::new();
        let state = root(vec![
            post("p1", "u1", "2024-01-01T00:00:00Z"),
            post("p2", "u2", "2024-01-02T00:00:00Z"),
        ]);

        let first = selectors.all_posts(&state);
        let second = selectors.all_posts(&state);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].id.as_str(), "p2");
    }

    #[test]
    fn test_posts_by_user_recomputes_only_on_posts_change() {
        let selectors = Selectors::new();
        let state = root(vec![
            post("p1", "u1", "2024-01-01T00:00:00Z"),
            post("p2", "u2", "2024-01-02T00:00:00Z"),
            post("p3", "u1", "2024-01-03T00:00:00Z"),
        ]);
        let u1 = UserId::from("u1");
        let u2 = UserId::from("u2");

        let mine = selectors.posts_by_user(&state, &u1);
        assert_eq!(mine.len(), 2);
        selectors.posts_by_user(&state, &u2);
        let again = selectors.posts_by_user(&state, &u1);
        assert!(Arc::ptr_eq(&mine, &again));
        assert_eq!(selectors.posts_by_user_recomputations(), 2);

        // Notification or user changes leave the posts collection alone.
        let unrelated = RootState {
            users: Arc::new(UsersState::default()),
            ..state.clone()
        };
        let same = selectors.posts_by_user(&unrelated, &u1);
        assert!(Arc::ptr_eq(&mine, &same));
        assert_eq!(selectors.posts_by_user_recomputations(), 2);

        // A reaction replaces the posts collection.
        let posts = PostsState::reduce(
            &state.posts,
            PostsAction::reaction_added("p2", "heart").unwrap(),
        )
        .unwrap();
        let changed = RootState { posts, ..state };
        let fresh = selectors.posts_by_user(&changed, &u1);
        assert!(!Arc::ptr_eq(&mine, &fresh));
        assert_eq!(fresh.len(), 2);
    }

    #[test]
    fn test_post_ids_follow_sort_order() {
        let selectors = Selectors::new();
        let state = root(vec![
            post("old", "u1", "2024-01-01T00:00:00Z"),
            post("new", "u1", "2024-02-01T00:00:00Z"),
        ]);
        let ids: Vec<_> = selectors.post_ids(&state).iter().map(ToString::to_string).collect();
        assert_eq!(ids, ["new", "old"]);
    }
}
