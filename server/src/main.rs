mod acl;
mod auth;
mod config;
mod db;
mod diff;
mod error;
mod git;
mod history;
mod hooks;
mod model;
mod sync;
mod version;
mod whatchanged;
mod wiki;

#[cfg(test)]
mod tests;

use config::WikiConfig;
use error::*;
use git::{Git, SharedVcs};

use axum::{routing::get, Extension, Router};
use sqlx::SqlitePool;
use std::{net::SocketAddr, sync::Arc};
use tower_http::{
    services::ServeDir,
    trace::{DefaultMakeSpan, TraceLayer},
};
use tower_sessions::{cookie::SameSite, ExpiredDeletion, Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::SqliteStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub const USER_ID_KEY: &str = "user_id";

pub fn app(
    pool: SqlitePool,
    config: Arc<WikiConfig>,
    vcs: SharedVcs,
    session_store: SqliteStore,
) -> Router {
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::days(30)));

    Router::new()
        .route("/", get(wiki::get_index))
        .route(
            "/_history/*slug",
            get(history::get_history).post(history::post_history),
        )
        .route(
            "/_version/*path",
            get(version::get_version).post(version::post_restore),
        )
        .route("/_diff/*path", get(diff::get_diff))
        .route("/_whatchanged", get(whatchanged::get_whatchanged))
        .route("/_whatchanged/:pag", get(whatchanged::get_whatchanged_page))
        .route(
            "/_hooks/pull/:remote",
            get(hooks::get_pull).post(hooks::post_pull),
        )
        .route(
            "/login",
            get(auth::login::get_login).post(auth::login::post_login),
        )
        .route(
            "/register",
            get(auth::register::get_register).post(auth::register::post_register),
        )
        .route("/logout", get(auth::logout::get_logout))
        .nest_service("/static", ServeDir::new(&config.public_dir))
        .fallback(wiki::get_page)
        .layer(Extension(vcs))
        .layer(Extension(config))
        .layer(Extension(pool))
        .layer(session_layer)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(true)),
        )
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            dotenv::var("RUST_LOG").unwrap_or_else(|_| "sqlx=warn,tower_http=info,info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("starting server ...");

    let config = Arc::new(WikiConfig::from_env()?);

    let pool = db::setup(&config.database_url).await?;

    let session_store = SqliteStore::new(pool.clone());
    session_store.migrate().await?;

    let _deletion_task = tokio::task::spawn(
        session_store
            .clone()
            .continuously_delete_expired(tokio::time::Duration::from_secs(60 * 60)),
    );

    match sync::sync_pages(&pool, &config.data_dir).await {
        Ok(log) => tracing::info!("page index synced:\n{}", log.trim_end()),
        Err(err) => tracing::warn!("initial page sync failed: {}", err),
    }

    let vcs: SharedVcs = Arc::new(Git::new(&config.data_dir, &config.git_branch));

    let app = app(pool, config.clone(), vcs, session_store);

    let addr: SocketAddr = config.server_address.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
