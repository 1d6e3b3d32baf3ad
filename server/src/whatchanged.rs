use crate::{config::WikiConfig, git::SharedVcs, model::Page, ServerError};
use askama::Template;
use askama_axum::{IntoResponse, Response};
use axum::{extract::Path, Extension};
use shared::Pagination;
use sqlx::SqlitePool;
use std::sync::Arc;

pub struct ChangeRow {
    page: Page,
    author: String,
    version: String,
    message: String,
    date: String,
}

#[derive(Template)]
#[template(path = "whatchanged.html")]
pub struct WhatChangedTemplate {
    changes: Vec<ChangeRow>,
    prev: Option<u64>,
    next: Option<u64>,
}

pub async fn get_whatchanged(
    pool: Extension<SqlitePool>,
    config: Extension<Arc<WikiConfig>>,
    vcs: Extension<SharedVcs>,
) -> Result<Response, ServerError> {
    whatchanged(pool, config, vcs, 1).await
}

pub async fn get_whatchanged_page(
    pool: Extension<SqlitePool>,
    config: Extension<Arc<WikiConfig>>,
    vcs: Extension<SharedVcs>,
    Path(pag): Path<u64>,
) -> Result<Response, ServerError> {
    whatchanged(pool, config, vcs, pag).await
}

async fn whatchanged(
    Extension(pool): Extension<SqlitePool>,
    Extension(config): Extension<Arc<WikiConfig>>,
    Extension(vcs): Extension<SharedVcs>,
    pag: u64,
) -> Result<Response, ServerError> {
    let total = vcs.total_commits().await?;
    let pagination = Pagination::new(pag, config.paginate_by, total);

    let mut changes = Vec::new();
    for change in vcs.whatchanged(pagination.skip(), pagination.per_page).await? {
        for path in &change.paths {
            let Some(page) = Page::by_path(&pool, path).await? else {
                continue;
            };

            changes.push(ChangeRow {
                page,
                author: change.author.clone(),
                version: change.version.clone(),
                message: change.message.clone(),
                date: change.date(),
            });
        }
    }

    tracing::debug!(
        "page {} of recent changes: {} rows from {} commits",
        pagination.page,
        changes.len(),
        total
    );

    Ok(WhatChangedTemplate {
        changes,
        prev: pagination.prev(),
        next: pagination.next(),
    }
    .into_response())
}
