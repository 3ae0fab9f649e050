use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Published article.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub category: String,
    pub slug: String,
    #[serde(with = "time::serde::rfc3339")]
    pub published_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Insert payload, used by the seeder.
#[derive(Debug)]
pub struct NewPost<'a> {
    pub title: &'a str,
    pub content: &'a str,
    pub excerpt: &'a str,
    pub category: &'a str,
    pub slug: &'a str,
    pub published_at: OffsetDateTime,
}

impl Post {
    /// Newest first.
    pub async fn list(db: &PgPool, limit: i64, offset: i64) -> anyhow::Result<Vec<Post>> {
        let rows = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, title, content, excerpt, category, slug, published_at, created_at
            FROM posts
            ORDER BY published_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn find_by_slug(db: &PgPool, slug: &str) -> anyhow::Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, title, content, excerpt, category, slug, published_at, created_at
            FROM posts
            WHERE slug = $1
            "#,
        )
        .bind(slug)
        .fetch_optional(db)
        .await?;
        Ok(post)
    }

    pub async fn create(db: &PgPool, new: &NewPost<'_>) -> anyhow::Result<Post> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (title, content, excerpt, category, slug, published_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, title, content, excerpt, category, slug, published_at, created_at
            "#,
        )
        .bind(new.title)
        .bind(new.content)
        .bind(new.excerpt)
        .bind(new.category)
        .bind(new.slug)
        .bind(new.published_at)
        .fetch_one(db)
        .await?;
        Ok(post)
    }
}
