use crate::{acl, config::WikiConfig, model::Page, ServerError};
use askama::Template;
use askama_axum::{IntoResponse, Response};
use axum::{http::Uri, response::Redirect, Extension};
use shared::{is_valid_slug, Permission};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_sessions::Session;

#[derive(Template)]
#[template(path = "page.html")]
pub struct PageTemplate {
    page: Page,
    content: String,
}

/// The page record for `slug`, treating malformed slugs like missing pages.
pub async fn find_page(pool: &SqlitePool, slug: &str) -> Result<Page, ServerError> {
    let slug = slug.trim_matches('/');
    if !is_valid_slug(slug) {
        return Err(ServerError::NotFound);
    }

    Page::by_slug(pool, slug).await?.ok_or(ServerError::NotFound)
}

pub async fn get_index(Extension(config): Extension<Arc<WikiConfig>>) -> Redirect {
    Redirect::to(&format!("/{}", config.home_slug))
}

pub async fn get_page(
    session: Session,
    Extension(pool): Extension<SqlitePool>,
    Extension(config): Extension<Arc<WikiConfig>>,
    uri: Uri,
) -> Result<Response, ServerError> {
    acl::require(&session, &pool, &config, Permission::ViewPage, uri.path()).await?;

    let page = find_page(&pool, uri.path()).await?;

    let source = match tokio::fs::read_to_string(page.abspath(&config.data_dir)).await {
        Ok(source) => source,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!("file of page {} is missing: {}", page.slug, page.path);
            String::new()
        }
        Err(err) => return Err(err.into()),
    };

    Ok(PageTemplate {
        content: page.preview(&source),
        page,
    }
    .into_response())
}
