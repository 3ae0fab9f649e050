use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::instrument;

use crate::{
    error::{reply, ApiError, Envelope},
    posts::dto::{Pagination, PostListItem},
    posts::repo::Post,
    state::AppState,
};

type Reply<T> = Result<(StatusCode, Json<Envelope<T>>), ApiError>;

#[instrument(skip(state))]
pub async fn list_posts(
    State(state): State<AppState>,
    Query(p): Query<Pagination>,
) -> Reply<Vec<PostListItem>> {
    let posts = Post::list(&state.db, p.limit, p.offset).await?;
    let items: Vec<PostListItem> = posts.into_iter().map(PostListItem::from).collect();
    Ok(reply(StatusCode::OK, "posts fetched", Some(items)))
}

#[instrument(skip(state))]
pub async fn get_post(State(state): State<AppState>, Path(slug): Path<String>) -> Reply<Post> {
    let post = Post::find_by_slug(&state.db, &slug)
        .await?
        .ok_or_else(|| ApiError::NotFound("post not found".into()))?;
    Ok(reply(StatusCode::OK, "post fetched", Some(post)))
}
