//! Posts Workflows
//!
//! List loading and server-side post creation.

use super::{begin_guarded, settle_fetch, FetchOutcome};
use crate::domain::{NewPost, Post, PostPatch};
use crate::errors::{TransportError, WorkflowError};
use crate::slices::posts::{ADD_NEW_POST, FETCH_POSTS};
use crate::slices::PostsAction;
use crate::store::Store;
use crate::transport::extract_field;
use bulletin_core::Lifecycle;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Load the posts list once.
///
/// **What it does**: Fetches all posts if the list has never been requested
/// **Returns**: `Skipped` unless the fetch tracker was idle and this caller
/// started it
pub async fn fetch_posts(store: &Store) -> Result<FetchOutcome, WorkflowError> {
    run_fetch_posts(store, PostsAction::FetchPostsIfIdle).await
}

/// Load the posts list again, e.g. after a failure.
///
/// **What it does**: Fetches all posts unless a fetch is in flight
/// **Returns**: `Skipped` only if another fetch is pending
pub async fn refetch_posts(store: &Store) -> Result<FetchOutcome, WorkflowError> {
    run_fetch_posts(store, PostsAction::FetchPosts(Lifecycle::Pending)).await
}

async fn run_fetch_posts(store: &Store, start: PostsAction) -> Result<FetchOutcome, WorkflowError> {
    if !begin_guarded(store, FETCH_POSTS, start)? {
        return Ok(FetchOutcome::Skipped);
    }
    let path = store.config().posts_path();
    debug!(operation = FETCH_POSTS, %path, "fetch started");

    let result = store
        .transport()
        .get(&path)
        .await
        .and_then(|payload| extract_field::<Vec<PostPatch>>(&path, payload, "posts"));
    settle_fetch(
        store,
        FETCH_POSTS,
        &path,
        result,
        |records| PostsAction::FetchPosts(Lifecycle::Fulfilled(records)),
        |message| PostsAction::FetchPosts(Lifecycle::Rejected(message)),
    )
}

#[derive(Serialize)]
struct CreatePostBody<'a> {
    post: &'a NewPost,
}

/// Create a post on the server and add the stored version locally.
///
/// **What it does**: Validates the input, POSTs it, inserts the returned post
/// **Returns**: The post as stored by the server
///
/// A transport failure is recorded on the `posts/addNewPost` tracker and then
/// returned, so the caller can keep the form contents and let the user retry.
pub async fn add_new_post(store: &Store, new_post: NewPost) -> Result<Post, WorkflowError> {
    new_post.validate()?;
    store.dispatch(PostsAction::AddNewPost(Lifecycle::Pending))?;
    let path = store.config().posts_path();
    debug!(operation = ADD_NEW_POST, %path, "create started");

    let result = match serde_json::to_value(CreatePostBody { post: &new_post }) {
        Ok(body) => store
            .transport()
            .post(&path, body)
            .await
            .and_then(|payload| extract_field::<Post>(&path, payload, "post")),
        Err(err) => Err(TransportError::Decode {
            path: path.clone(),
            reason: err.to_string(),
        }),
    };

    match result {
        Ok(post) => {
            store.dispatch(PostsAction::AddNewPost(Lifecycle::Fulfilled(post.clone())))?;
            info!(operation = ADD_NEW_POST, post = %post.id, "post created");
            Ok(post)
        }
        Err(err) => {
            warn!(operation = ADD_NEW_POST, %path, error = %err, "create failed");
            store.dispatch(PostsAction::AddNewPost(Lifecycle::Rejected(err.to_string())))?;
            Err(err.into())
        }
    }
}
