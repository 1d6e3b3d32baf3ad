use crate::{config::WikiConfig, git::SharedVcs, sync::sync_pages, ServerError};
use askama_axum::{IntoResponse, Response};
use axum::{extract::Path, http::StatusCode, Extension, Json};
use serde::Serialize;
use shared::is_valid_remote;
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::Instrument;

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum PullReport {
    Done { pull: String, sync: String },
    Failed { error: String },
}

pub async fn get_pull(Path(remote): Path<String>) -> Result<Response, ServerError> {
    if !is_valid_remote(&remote) {
        return Err(ServerError::NotFound);
    }

    Ok(format!("POST to /_hooks/pull/{remote}").into_response())
}

/// Pulls `remote` and reindexes the pages. Failures are reported in the JSON
/// body with a 500.
pub async fn post_pull(
    Extension(pool): Extension<SqlitePool>,
    Extension(config): Extension<Arc<WikiConfig>>,
    Extension(vcs): Extension<SharedVcs>,
    Path(remote): Path<String>,
) -> Result<Response, ServerError> {
    if !is_valid_remote(&remote) {
        return Err(ServerError::NotFound);
    }

    let span = tracing::span!(tracing::Level::INFO, "pull_webhook", remote = %remote);

    let result: Result<(String, String), ServerError> = async {
        tracing::info!("handling pull webhook");
        let pull = vcs.pull(&remote).await?;
        let sync = sync_pages(&pool, &config.data_dir).await?;
        Ok((pull, sync))
    }
    .instrument(span)
    .await;

    let (status, report) = match result {
        Ok((pull, sync)) => (StatusCode::OK, PullReport::Done { pull, sync }),
        Err(err) => {
            tracing::error!("pull from {} failed: {}", remote, err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                PullReport::Failed {
                    error: err.to_string(),
                },
            )
        }
    };

    Ok((status, Json(report)).into_response())
}
