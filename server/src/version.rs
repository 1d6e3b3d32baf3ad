use crate::{acl, config::WikiConfig, git::SharedVcs, model::Page, wiki::find_page, ServerError};
use askama::Template;
use askama_axum::{IntoResponse, Response};
use axum::{
    extract::Path,
    http::{header, Uri},
    response::Redirect,
    Extension, Form,
};
use serde::Deserialize;
use shared::{is_valid_revision, Permission};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_sessions::Session;

pub const ANONYMOUS_AUTHOR: &str = "anonymous";

#[derive(Template)]
#[template(path = "version.html")]
pub struct VersionTemplate {
    page: Page,
    content: String,
    version: String,
    message: String,
    raw: String,
}

#[derive(Debug, Deserialize)]
pub struct RestoreForm {
    #[serde(default)]
    message: String,
    raw: String,
}

/// Splits `{slug}/{revision}` or `{slug}/{revision}/raw`.
pub fn split_version_path(path: &str) -> Option<(&str, &str, bool)> {
    let path = path.trim_matches('/');
    let (path, raw) = match path.strip_suffix("/raw") {
        Some(path) => (path, true),
        None => (path, false),
    };

    let (slug, revision) = path.rsplit_once('/')?;
    if !is_valid_revision(revision) {
        return None;
    }

    Some((slug, revision, raw))
}

pub async fn get_version(
    session: Session,
    Extension(pool): Extension<SqlitePool>,
    Extension(config): Extension<Arc<WikiConfig>>,
    Extension(vcs): Extension<SharedVcs>,
    Path(path): Path<String>,
    uri: Uri,
) -> Result<Response, ServerError> {
    acl::require(&session, &pool, &config, Permission::ViewPage, uri.path()).await?;

    let (slug, version, raw) = split_version_path(&path).ok_or(ServerError::NotFound)?;
    let page = find_page(&pool, slug).await?;

    let content = vcs
        .version(&page.path, version)
        .await?
        .filter(|content| !content.is_empty())
        .ok_or(ServerError::NotFound)?;

    if raw {
        return Ok((
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            content,
        )
            .into_response());
    }

    Ok(VersionTemplate {
        content: page.preview(&content),
        message: format!("Restored version @{version}"),
        version: version.to_string(),
        raw: content,
        page,
    }
    .into_response())
}

pub async fn post_restore(
    session: Session,
    Extension(pool): Extension<SqlitePool>,
    Extension(config): Extension<Arc<WikiConfig>>,
    Extension(vcs): Extension<SharedVcs>,
    Path(path): Path<String>,
    uri: Uri,
    Form(restore): Form<RestoreForm>,
) -> Result<Response, ServerError> {
    let user = acl::require(&session, &pool, &config, Permission::ChangePage, uri.path()).await?;

    let (slug, version, raw) = split_version_path(&path).ok_or(ServerError::NotFound)?;
    if raw {
        return Err(ServerError::NotFound);
    }
    let page = find_page(&pool, slug).await?;

    let message = match restore.message.trim() {
        "" => format!("Restored version @{version}"),
        message => message.to_string(),
    };
    let author = user
        .as_ref()
        .map(|user| user.username.as_str())
        .unwrap_or(ANONYMOUS_AUTHOR);

    let abspath = page.abspath(&config.data_dir);
    if let Some(parent) = abspath.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&abspath, restore.raw.replace("\r\n", "\n")).await?;
    vcs.commit(&page.path, &message, author).await?;

    tracing::info!("{} restored {} to {}", author, page.slug, version);

    Ok(Redirect::to(&format!("/{}", page.slug)).into_response())
}

#[cfg(test)]
mod tests {
    use super::split_version_path;

    #[test]
    fn version_paths() {
        assert_eq!(
            split_version_path("docs/intro/abc1234"),
            Some(("docs/intro", "abc1234", false))
        );
        assert_eq!(
            split_version_path("home/abc1234/raw/"),
            Some(("home", "abc1234", true))
        );
        assert_eq!(split_version_path("home/HEAD"), None);
        assert_eq!(split_version_path("abc1234"), None);
    }
}
