use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::posts::repo::Post;

/// Listing entry: everything a card needs, without the full body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostListItem {
    pub id: Uuid,
    pub title: String,
    pub excerpt: String,
    pub category: String,
    pub slug: String,
    #[serde(with = "time::serde::rfc3339")]
    pub published_at: OffsetDateTime,
}

impl From<Post> for PostListItem {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            title: post.title,
            excerpt: post.excerpt,
            category: post.category,
            slug: post.slug,
            published_at: post.published_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    20
}
