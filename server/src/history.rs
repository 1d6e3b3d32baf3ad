use crate::{acl, config::WikiConfig, git::SharedVcs, model::Page, wiki::find_page, ServerError};
use askama::Template;
use askama_axum::{IntoResponse, Response};
use axum::{extract::Path, http::Uri, response::Redirect, Extension, Form};
use shared::{is_valid_revision, max_changes, HistoryEntry, Permission};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_sessions::Session;

#[derive(Template)]
#[template(path = "history.html")]
pub struct HistoryTemplate {
    page: Page,
    history: Vec<HistoryEntry>,
    max_changes: u64,
}

impl HistoryTemplate {
    // Percentage of the widest bar.
    fn bar_width(&self, entry: &HistoryEntry) -> u64 {
        if self.max_changes == 0 {
            0
        } else {
            entry.changes() * 100 / self.max_changes
        }
    }
}

pub async fn get_history(
    session: Session,
    Extension(pool): Extension<SqlitePool>,
    Extension(config): Extension<Arc<WikiConfig>>,
    Extension(vcs): Extension<SharedVcs>,
    Path(slug): Path<String>,
    uri: Uri,
) -> Result<Response, ServerError> {
    acl::require(&session, &pool, &config, Permission::ViewPage, uri.path()).await?;

    let page = find_page(&pool, &slug).await?;
    let history = vcs.history(&page.path).await?;

    tracing::debug!("{} revisions of {}", history.len(), page.slug);

    Ok(HistoryTemplate {
        max_changes: max_changes(&history),
        page,
        history,
    }
    .into_response())
}

/// Turns the two revisions ticked in the history table into a diff redirect.
/// The form lists newer revisions first.
pub async fn post_history(
    session: Session,
    Extension(pool): Extension<SqlitePool>,
    Extension(config): Extension<Arc<WikiConfig>>,
    Path(slug): Path<String>,
    uri: Uri,
    Form(fields): Form<Vec<(String, String)>>,
) -> Result<Response, ServerError> {
    acl::require(&session, &pool, &config, Permission::ViewPage, uri.path()).await?;

    let page = find_page(&pool, &slug).await?;

    let commits: Vec<&str> = fields
        .iter()
        .filter(|(name, _)| name == "commit")
        .map(|(_, value)| value.as_str())
        .collect();

    let &[new, old] = commits.as_slice() else {
        return Err(ServerError::BadRequest(format!(
            "select exactly two revisions, got {}",
            commits.len()
        )));
    };

    if !is_valid_revision(new) || !is_valid_revision(old) {
        return Err(ServerError::BadRequest(String::from("malformed revision")));
    }

    Ok(Redirect::to(&format!("/_diff/{}/{}..{}", page.slug, old, new)).into_response())
}
