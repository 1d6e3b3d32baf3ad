use crate::git::GitError;
use askama::Template;
use askama_axum::IntoResponse;
use axum::{
    http::StatusCode,
    response::{Redirect, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("not found")]
    NotFound,
    #[error("permission denied")]
    PermissionDenied,
    #[error("login required")]
    LoginRequired { next: String },
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error(transparent)]
    Git(#[from] GitError),
    #[error(transparent)]
    SqliteError(#[from] sqlx::Error),
    #[error(transparent)]
    SessionError(#[from] tower_sessions::session::Error),
    #[error(transparent)]
    HashError(#[from] bcrypt::BcryptError),
    #[error(transparent)]
    JoinError(#[from] tokio::task::JoinError),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error(transparent)]
    TemplateError(#[from] askama::Error),
    #[error("configuration error: {0}")]
    Config(String),
}

#[derive(Template, Default)]
#[template(path = "404.html")]
pub struct NotFoundTemplate {}

#[derive(Template, Default)]
#[template(path = "403.html")]
pub struct ForbiddenTemplate {}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        match self {
            ServerError::NotFound => {
                (StatusCode::NOT_FOUND, NotFoundTemplate::default()).into_response()
            }
            ServerError::PermissionDenied => {
                (StatusCode::FORBIDDEN, ForbiddenTemplate::default()).into_response()
            }
            ServerError::LoginRequired { next } => {
                let next: String = form_urlencoded::byte_serialize(next.as_bytes()).collect();
                Redirect::to(&format!("/login?next={next}")).into_response()
            }
            ServerError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            err => {
                tracing::error!("request failed: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, format!("{}", err)).into_response()
            }
        }
    }
}
