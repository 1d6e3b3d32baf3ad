use shared::{Markup, PageId, Permission, UserId};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Page {
    pub page_id: PageId,
    pub slug: String,
    pub path: String,
    pub title: String,
    pub markup: String,
}

impl Page {
    pub async fn by_slug(pool: &SqlitePool, slug: &str) -> Result<Option<Page>, sqlx::Error> {
        sqlx::query_as(
            r#"
                SELECT page_id, slug, path, title, markup
                FROM pages
                WHERE slug = $1
            "#,
        )
        .bind(slug)
        .fetch_optional(pool)
        .await
    }

    pub async fn by_path(pool: &SqlitePool, path: &str) -> Result<Option<Page>, sqlx::Error> {
        sqlx::query_as(
            r#"
                SELECT page_id, slug, path, title, markup
                FROM pages
                WHERE path = $1
            "#,
        )
        .bind(path)
        .fetch_optional(pool)
        .await
    }

    pub async fn all(pool: &SqlitePool) -> Result<Vec<Page>, sqlx::Error> {
        sqlx::query_as(
            r#"
                SELECT page_id, slug, path, title, markup
                FROM pages
                ORDER BY slug
            "#,
        )
        .fetch_all(pool)
        .await
    }

    pub async fn create(
        pool: &SqlitePool,
        slug: &str,
        path: &str,
        title: &str,
        markup: Markup,
    ) -> Result<Page, sqlx::Error> {
        sqlx::query_as(
            r#"
                INSERT INTO pages (slug, path, title, markup)
                VALUES ($1, $2, $3, $4)
                RETURNING page_id, slug, path, title, markup
            "#,
        )
        .bind(slug)
        .bind(path)
        .bind(title)
        .bind(markup.to_string())
        .fetch_one(pool)
        .await
    }

    pub async fn delete(&self, pool: &SqlitePool) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
                DELETE FROM pages
                WHERE page_id = $1
            "#,
        )
        .bind(self.page_id)
        .execute(pool)
        .await?;

        Ok(())
    }

    pub fn markup(&self) -> Markup {
        self.markup.parse().unwrap_or_default()
    }

    pub fn preview(&self, content: &str) -> String {
        self.markup().render(content)
    }

    pub fn abspath(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.path)
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub user_id: UserId,
    pub username: String,
    pub admin: bool,
}

impl User {
    pub async fn by_id(pool: &SqlitePool, user_id: UserId) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as(
            r#"
                SELECT user_id, username, admin
                FROM users
                WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn granted_permissions(
        &self,
        pool: &SqlitePool,
    ) -> Result<Vec<Permission>, sqlx::Error> {
        let names: Vec<(String,)> = sqlx::query_as(
            r#"
                SELECT permission
                FROM user_permissions
                WHERE user_id = $1
            "#,
        )
        .bind(self.user_id)
        .fetch_all(pool)
        .await?;

        Ok(names
            .into_iter()
            .filter_map(|(name,)| name.parse().ok())
            .collect())
    }
}
