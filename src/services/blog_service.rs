use sqlx::PgPool;
use uuid::Uuid;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::BlogPost;

#[derive(Debug, thiserror::Error)]
pub enum BlogError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Database manager error: {0}")]
    Manager(#[from] DatabaseError),
    #[error("Blog post not found: {0}")]
    NotFound(String),
    #[error("Could not derive a unique slug for: {0}")]
    SlugExhausted(String),
}

#[derive(Debug, Clone)]
pub struct NewBlogPost {
    pub title: String,
    pub excerpt: Option<String>,
    pub content: String,
    pub cover_image_url: Option<String>,
    pub published: bool,
    pub author_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default)]
pub struct BlogPostPatch {
    pub title: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub cover_image_url: Option<String>,
    pub published: Option<bool>,
}

pub struct BlogService {
    pool: PgPool,
}

/// Derive a URL slug from a post title: lowercase, alphanumerics kept,
/// everything else collapsed to single hyphens.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_was_hyphen = true; // suppress leading hyphen

    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            slug.push('-');
            last_was_hyphen = true;
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }

    if slug.is_empty() {
        slug.push_str("post");
    }

    slug
}

const MAX_SLUG_ATTEMPTS: u32 = 20;

impl BlogService {
    pub async fn new() -> Result<Self, BlogError> {
        let pool = DatabaseManager::pool().await?;
        Ok(Self { pool })
    }

    /// Create a post. Slug uniqueness is enforced by the unique index:
    /// conflicting inserts return no row and the next suffix is tried, so
    /// two admins publishing the same title concurrently cannot collide.
    pub async fn create(&self, post: NewBlogPost) -> Result<BlogPost, BlogError> {
        let base = slugify(&post.title);

        for attempt in 1..=MAX_SLUG_ATTEMPTS {
            let slug = if attempt == 1 {
                base.clone()
            } else {
                format!("{}-{}", base, attempt)
            };

            let inserted = sqlx::query_as::<_, BlogPost>(
                "INSERT INTO blog_posts (title, slug, excerpt, content, cover_image_url, published, author_id)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)
                 ON CONFLICT (slug) DO NOTHING
                 RETURNING *",
            )
            .bind(&post.title)
            .bind(&slug)
            .bind(&post.excerpt)
            .bind(&post.content)
            .bind(&post.cover_image_url)
            .bind(post.published)
            .bind(post.author_id)
            .fetch_optional(&self.pool)
            .await?;

            if let Some(created) = inserted {
                return Ok(created);
            }
        }

        Err(BlogError::SlugExhausted(post.title))
    }

    /// Partial update; the slug stays stable so published URLs never break.
    pub async fn update(&self, id: Uuid, patch: BlogPostPatch) -> Result<BlogPost, BlogError> {
        sqlx::query_as::<_, BlogPost>(
            "UPDATE blog_posts
             SET title = COALESCE($2, title),
                 excerpt = COALESCE($3, excerpt),
                 content = COALESCE($4, content),
                 cover_image_url = COALESCE($5, cover_image_url),
                 published = COALESCE($6, published),
                 updated_at = now()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(patch.title)
        .bind(patch.excerpt)
        .bind(patch.content)
        .bind(patch.cover_image_url)
        .bind(patch.published)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| BlogError::NotFound(id.to_string()))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), BlogError> {
        let deleted = sqlx::query("DELETE FROM blog_posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if deleted.rows_affected() == 0 {
            return Err(BlogError::NotFound(id.to_string()));
        }
        Ok(())
    }

    pub async fn list_published(&self) -> Result<Vec<BlogPost>, BlogError> {
        let posts = sqlx::query_as::<_, BlogPost>(
            "SELECT * FROM blog_posts WHERE published = TRUE ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(posts)
    }

    /// Fetch a published post and bump its view counter. Increment and read
    /// are one statement, so each successful fetch counts exactly once.
    pub async fn get_by_slug(&self, slug: &str) -> Result<BlogPost, BlogError> {
        sqlx::query_as::<_, BlogPost>(
            "UPDATE blog_posts
             SET view_count = view_count + 1
             WHERE slug = $1 AND published = TRUE
             RETURNING *",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| BlogError::NotFound(slug.to_string()))
    }

    pub async fn published_count(&self) -> Result<i64, BlogError> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM blog_posts WHERE published = TRUE")
                .fetch_one(&self.pool)
                .await?;
        Ok(count.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_lowercases_and_hyphenates() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("The Future of AI Art!"), "the-future-of-ai-art");
    }

    #[test]
    fn slugify_collapses_runs_of_separators() {
        assert_eq!(slugify("a  --  b"), "a-b");
        assert_eq!(slugify("  padded  "), "padded");
    }

    #[test]
    fn slugify_handles_symbol_only_titles() {
        assert_eq!(slugify("!!!"), "post");
        assert_eq!(slugify(""), "post");
    }

    #[test]
    fn slugify_keeps_digits() {
        assert_eq!(slugify("Top 10 Models (2025)"), "top-10-models-2025");
    }
}
