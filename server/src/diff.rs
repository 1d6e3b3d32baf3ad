use crate::{acl, config::WikiConfig, git::SharedVcs, model::Page, wiki::find_page, ServerError};
use askama::Template;
use askama_axum::{IntoResponse, Response};
use axum::{
    extract::Path,
    http::{header, Uri},
    Extension,
};
use shared::{is_valid_revision, visible_whitespace, Permission};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_sessions::Session;

#[derive(Template)]
#[template(path = "diff.html")]
pub struct DiffTemplate {
    page: Page,
    old_content: String,
    new_content: String,
    old_commit: String,
    new_commit: String,
}

/// Splits `{slug}/{old}..{new}` or `{slug}/{old}..{new}/raw`.
pub fn split_diff_path(path: &str) -> Option<(&str, &str, &str, bool)> {
    let path = path.trim_matches('/');
    let (path, raw) = match path.strip_suffix("/raw") {
        Some(path) => (path, true),
        None => (path, false),
    };

    let (slug, range) = path.rsplit_once('/')?;
    let (old, new) = range.split_once("..")?;
    if !is_valid_revision(old) || !is_valid_revision(new) {
        return None;
    }

    Some((slug, old, new, raw))
}

pub async fn get_diff(
    session: Session,
    Extension(pool): Extension<SqlitePool>,
    Extension(config): Extension<Arc<WikiConfig>>,
    Extension(vcs): Extension<SharedVcs>,
    Path(path): Path<String>,
    uri: Uri,
) -> Result<Response, ServerError> {
    acl::require(&session, &pool, &config, Permission::ViewPage, uri.path()).await?;

    let (slug, old, new, raw) = split_diff_path(&path).ok_or(ServerError::NotFound)?;
    let page = find_page(&pool, slug).await?;

    if raw {
        let content = vcs.diff(&page.path, new, old).await?;
        return Ok((
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            content,
        )
            .into_response());
    }

    let old_content = vcs
        .version(&page.path, old)
        .await?
        .filter(|content| !content.is_empty())
        .ok_or(ServerError::NotFound)?;
    let new_content = vcs
        .version(&page.path, new)
        .await?
        .filter(|content| !content.is_empty())
        .ok_or(ServerError::NotFound)?;

    Ok(DiffTemplate {
        page,
        old_content: visible_whitespace(&old_content),
        new_content: visible_whitespace(&new_content),
        old_commit: old.to_string(),
        new_commit: new.to_string(),
    }
    .into_response())
}
