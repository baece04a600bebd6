//! In-memory fake of the bulletin REST API.
//!
//! Serves the endpoints the workflows call:
//!
//! | request                              | response                     |
//! |--------------------------------------|------------------------------|
//! | `GET  {root}/posts`                  | `{"posts": [...]}`           |
//! | `POST {root}/posts` `{"post": {..}}` | `{"post": {...}}` (stored)   |
//! | `GET  {root}/users`                  | `{"users": [...]}`           |
//! | `GET  {root}/notifications?since=T`  | `{"notifications": [...]}` newer than `T` |
//!
//! Failures can be queued per path prefix with [`FakeApi::fail_next`].

use crate::clock::{FixedClock, SequentialIds};
use async_trait::async_trait;
use bulletin_app::{
    BulletinConfig, NewPost, Notification, Post, Reactions, Transport, TransportError, User,
};
use bulletin_core::{Clock, IdGenerator};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::VecDeque;

#[derive(Debug, Default)]
struct Db {
    posts: Vec<Post>,
    users: Vec<User>,
    notifications: Vec<Notification>,
}

/// A recorded request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Request {
    /// `GET` or `POST`.
    pub method: &'static str,
    /// Full path including the query string.
    pub path: String,
}

/// In-memory API server implementing [`Transport`].
pub struct FakeApi {
    root: String,
    db: Mutex<Db>,
    failures: Mutex<Vec<(String, VecDeque<TransportError>)>>,
    requests: Mutex<Vec<Request>>,
    clock: FixedClock,
    ids: SequentialIds,
}

impl FakeApi {
    /// Empty server under the default API root.
    pub fn new() -> Self {
        Self {
            root: BulletinConfig::default().api_root,
            db: Mutex::new(Db::default()),
            failures: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
            clock: FixedClock::at(crate::TEST_EPOCH),
            ids: SequentialIds::new("server-post"),
        }
    }

    /// Seed posts.
    pub fn with_posts(self, posts: Vec<Post>) -> Self {
        self.db.lock().posts = posts;
        self
    }

    /// Seed users.
    pub fn with_users(self, users: Vec<User>) -> Self {
        self.db.lock().users = users;
        self
    }

    /// Seed notifications.
    pub fn with_notifications(self, notifications: Vec<Notification>) -> Self {
        self.db.lock().notifications = notifications;
        self
    }

    /// Add notifications on the server after construction.
    pub fn push_notifications(&self, notifications: impl IntoIterator<Item = Notification>) {
        self.db.lock().notifications.extend(notifications);
    }

    /// Fail the next request whose path starts with `{root}{prefix}`.
    pub fn fail_next(&self, prefix: &str, error: TransportError) {
        let prefix = format!("{}{prefix}", self.root);
        let mut failures = self.failures.lock();
        match failures.iter_mut().find(|(p, _)| *p == prefix) {
            Some((_, queue)) => queue.push_back(error),
            None => failures.push((prefix, VecDeque::from([error]))),
        }
    }

    /// Every request served so far, oldest first.
    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().clone()
    }

    /// Posts currently stored on the server.
    pub fn stored_posts(&self) -> Vec<Post> {
        self.db.lock().posts.clone()
    }

    fn record(&self, method: &'static str, path: &str) -> Result<(), TransportError> {
        self.requests.lock().push(Request {
            method,
            path: path.to_string(),
        });
        let mut failures = self.failures.lock();
        let queued = failures
            .iter_mut()
            .find(|(prefix, queue)| path.starts_with(prefix.as_str()) && !queue.is_empty())
            .and_then(|(_, queue)| queue.pop_front());
        match queued {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn route<'a>(&self, path: &'a str) -> Option<&'a str> {
        path.strip_prefix(self.root.as_str())
    }

    fn not_found(path: &str) -> TransportError {
        TransportError::Status {
            path: path.to_string(),
            status: 404,
        }
    }

    fn notifications_since(&self, path: &str, since: &str) -> Result<Value, TransportError> {
        let cursor: Option<DateTime<Utc>> = if since.is_empty() {
            None
        } else {
            let parsed = DateTime::parse_from_rfc3339(since).map_err(|e| {
                TransportError::Rejected {
                    path: path.to_string(),
                    reason: format!("bad since parameter: {e}"),
                }
            })?;
            Some(parsed.with_timezone(&Utc))
        };
        let db = self.db.lock();
        let newer: Vec<&Notification> = db
            .notifications
            .iter()
            .filter(|n| cursor.map_or(true, |since| n.date > since))
            .collect();
        Ok(json!({ "notifications": newer }))
    }
}

impl Default for FakeApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for FakeApi {
    async fn get(&self, path: &str) -> Result<Value, TransportError> {
        self.record("GET", path)?;
        match self.route(path) {
            Some("/posts") => {
                let db = self.db.lock();
                Ok(json!({ "posts": &db.posts }))
            }
            Some("/users") => {
                let db = self.db.lock();
                Ok(json!({ "users": &db.users }))
            }
            Some(route) => match route.strip_prefix("/notifications?since=") {
                Some(since) => self.notifications_since(path, since),
                None => Err(Self::not_found(path)),
            },
            None => Err(Self::not_found(path)),
        }
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value, TransportError> {
        self.record("POST", path)?;
        if self.route(path) != Some("/posts") {
            return Err(Self::not_found(path));
        }
        let input: NewPost = body
            .get("post")
            .cloned()
            .ok_or_else(|| TransportError::Rejected {
                path: path.to_string(),
                reason: "missing 'post'".to_string(),
            })
            .and_then(|post| {
                serde_json::from_value(post).map_err(|e| TransportError::Rejected {
                    path: path.to_string(),
                    reason: e.to_string(),
                })
            })?;
        let post = Post {
            id: self.ids.next_id().into(),
            title: input.title,
            content: input.content,
            date: self.clock.now(),
            user: input.user,
            reactions: Reactions::default(),
        };
        self.db.lock().posts.push(post.clone());
        Ok(json!({ "post": post }))
    }
}
