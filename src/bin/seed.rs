// Wipes the posts table and repopulates it with sample articles.

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use time::macros::datetime;

use minblog::posts::repo::{NewPost, Post};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()))
        .init();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
    let db = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await
        .context("connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .context("run database migrations")?;

    sqlx::query("DELETE FROM posts").execute(&db).await?;
    tracing::info!("cleared existing posts");

    for post in sample_posts() {
        let created = Post::create(&db, &post).await?;
        tracing::info!(slug = %created.slug, "seeded post");
    }

    tracing::info!("done");
    Ok(())
}

fn sample_posts() -> Vec<NewPost<'static>> {
    vec![
        NewPost {
            title: "Hello, blog",
            content: "This is the first post on the new platform. It exists mostly so the \
                      listing page has something to render, but it also marks the moment the \
                      backend started serving real content.\n\nMore to come.",
            excerpt: "The first post on the new platform.",
            category: "Meta",
            slug: "hello-blog",
            published_at: datetime!(2023-12-02 09:00 UTC),
        },
        NewPost {
            title: "Notes on pagination",
            content: "Offset pagination is easy to reason about and good enough for a small \
                      blog: the client asks for a limit and an offset, the database sorts by \
                      publication date and slices. Cursor pagination can come later if the \
                      archive ever grows past what offsets handle comfortably.",
            excerpt: "Why the post listing uses plain limit/offset.",
            category: "Engineering",
            slug: "notes-on-pagination",
            published_at: datetime!(2023-12-10 18:30 UTC),
        },
        NewPost {
            title: "A month of writing",
            content: "One post a week for a month. Some observations: drafts pile up faster \
                      than finished pieces, editing takes longer than writing, and the posts \
                      that took the least time are the ones people actually read.",
            excerpt: "Observations after four weeks of weekly posts.",
            category: "Life",
            slug: "a-month-of-writing",
            published_at: datetime!(2024-01-05 12:00 UTC),
        },
    ]
}
