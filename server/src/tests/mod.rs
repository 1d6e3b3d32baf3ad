mod git_wrapper;

use crate::config::WikiConfig;
use crate::git::{GitError, SharedVcs, VersionControl};
use crate::model::Page;
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request},
    response::Response,
    Router,
};
use shared::{Change, HistoryEntry, Markup, Permission};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tower::ServiceExt;
use tower_sessions_sqlx_store::SqliteStore;

// Answers from canned data and records what the views asked for.
#[derive(Default)]
pub struct MockState {
    pub history: Vec<HistoryEntry>,
    pub versions: HashMap<String, String>,
    pub diff: String,
    pub pull_error: Option<String>,
    pub changes: Vec<Change>,
    pub total: u64,

    pub diff_calls: Vec<(String, String, String)>,
    pub pulls: Vec<String>,
    pub whatchanged_calls: Vec<(u64, u64)>,
    pub commits: Vec<(String, String, String)>,
}

#[derive(Clone, Default)]
pub struct MockVcs {
    pub state: Arc<Mutex<MockState>>,
}

impl MockVcs {
    pub fn with<F: FnOnce(&mut MockState)>(&self, f: F) {
        f(&mut self.state.lock().unwrap());
    }

    pub fn add_version(&self, revision: &str, content: &str) {
        self.with(|state| {
            state
                .versions
                .insert(revision.to_string(), content.to_string());
        });
    }
}

#[async_trait]
impl VersionControl for MockVcs {
    async fn history(&self, _path: &str) -> Result<Vec<HistoryEntry>, GitError> {
        Ok(self.state.lock().unwrap().history.clone())
    }

    async fn version(&self, _path: &str, revision: &str) -> Result<Option<String>, GitError> {
        Ok(self.state.lock().unwrap().versions.get(revision).cloned())
    }

    async fn diff(&self, path: &str, new: &str, old: &str) -> Result<String, GitError> {
        let mut state = self.state.lock().unwrap();
        state
            .diff_calls
            .push((path.to_string(), new.to_string(), old.to_string()));
        Ok(state.diff.clone())
    }

    async fn pull(&self, remote: &str) -> Result<String, GitError> {
        let mut state = self.state.lock().unwrap();
        state.pulls.push(remote.to_string());
        match &state.pull_error {
            Some(stderr) => Err(GitError::Command {
                command: String::from("pull"),
                stderr: stderr.clone(),
            }),
            None => Ok(String::from("Already up to date.\n")),
        }
    }

    async fn total_commits(&self) -> Result<u64, GitError> {
        Ok(self.state.lock().unwrap().total)
    }

    async fn whatchanged(&self, skip: u64, max_count: u64) -> Result<Vec<Change>, GitError> {
        let mut state = self.state.lock().unwrap();
        state.whatchanged_calls.push((skip, max_count));
        Ok(state.changes.clone())
    }

    async fn commit(&self, path: &str, message: &str, author: &str) -> Result<(), GitError> {
        self.state.lock().unwrap().commits.push((
            path.to_string(),
            message.to_string(),
            author.to_string(),
        ));
        Ok(())
    }
}

pub struct TestWiki {
    pub app: Router,
    pub pool: SqlitePool,
    pub vcs: MockVcs,
    pub data_dir: TempDir,
}

pub fn test_config(data_dir: &TempDir) -> WikiConfig {
    WikiConfig {
        server_address: "127.0.0.1:0".into(),
        database_url: "sqlite::memory:".into(),
        data_dir: data_dir.path().to_path_buf(),
        public_dir: data_dir.path().join("public"),
        paginate_by: 20,
        git_branch: "master".into(),
        home_slug: "home".into(),
        anonymous_permissions: vec![Permission::ViewPage],
        logged_permissions: vec![
            Permission::ViewPage,
            Permission::AddPage,
            Permission::ChangePage,
        ],
    }
}

// a single connection keeps every query on the same in-memory database
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");

    crate::db::migrate(&pool)
        .await
        .expect("Failed to create tables");

    pool
}

pub async fn setup() -> TestWiki {
    setup_with(|_| {}).await
}

pub async fn setup_with<F: FnOnce(&mut WikiConfig)>(configure: F) -> TestWiki {
    let data_dir = TempDir::new().unwrap();
    let mut config = test_config(&data_dir);
    configure(&mut config);

    let pool = test_pool().await;
    let session_store = SqliteStore::new(pool.clone());
    session_store.migrate().await.unwrap();

    let vcs = MockVcs::default();
    let shared_vcs: SharedVcs = Arc::new(vcs.clone());

    let app = crate::app(pool.clone(), Arc::new(config), shared_vcs, session_store);

    TestWiki {
        app,
        pool,
        vcs,
        data_dir,
    }
}

impl TestWiki {
    // index a page and put its current content on disk
    pub async fn add_page(&self, slug: &str, path: &str, title: &str, content: &str) -> Page {
        let full_path = self.data_dir.path().join(path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&full_path, content).unwrap();

        let markup = full_path
            .extension()
            .and_then(|extension| extension.to_str())
            .and_then(Markup::from_extension)
            .unwrap_or_default();

        Page::create(&self.pool, slug, path, title, markup)
            .await
            .unwrap()
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.app.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response {
        let mut request = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        self.send(request.body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(&self, uri: &str, form: &str, cookie: Option<&str>) -> Response {
        let mut request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        self.send(request.body(Body::from(form.to_string())).unwrap())
            .await
    }

    // registers a user and returns the session cookie
    pub async fn register(&self, username: &str) -> String {
        let form = format!("username={username}&password=secret123&password_repeat=secret123");
        let response = self.post_form("/register", &form, None).await;
        assert!(
            response.status().is_redirection(),
            "registration of {username} failed with {}",
            response.status()
        );
        session_cookie(&response)
    }
}

pub fn session_cookie(response: &Response) -> String {
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("Should set a session cookie")
        .to_str()
        .unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

pub fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .expect("Should redirect")
        .to_str()
        .unwrap()
}

pub async fn body_string(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

pub fn history_entry(version: &str, insertion: u64, deletion: u64) -> HistoryEntry {
    HistoryEntry {
        version: version.to_string(),
        author: String::from("Jane Doe"),
        timestamp: 1_700_000_000,
        message: format!("Change {version}"),
        insertion,
        deletion,
    }
}
