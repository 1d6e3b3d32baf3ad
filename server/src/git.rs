use async_trait::async_trait;
use shared::log::{CHANGES_FORMAT, HISTORY_FORMAT};
use shared::{parse_changes, parse_history, Change, HistoryEntry};
use std::path::PathBuf;
use std::process::Output;
use std::sync::Arc;
use thiserror::Error;
use tokio::process::Command;

pub type SharedVcs = Arc<dyn VersionControl>;

#[derive(Debug, Error)]
pub enum GitError {
    #[error("failed to run git: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("git {command} failed: {stderr}")]
    Command { command: String, stderr: String },
    #[error("unexpected git output: {0}")]
    Output(String),
}

/// Version control operations the views delegate to. Paths are relative to
/// the work tree.
#[async_trait]
pub trait VersionControl: Send + Sync {
    async fn history(&self, path: &str) -> Result<Vec<HistoryEntry>, GitError>;

    /// File content at `revision`, or `None` if git cannot resolve it.
    async fn version(&self, path: &str, revision: &str) -> Result<Option<String>, GitError>;

    async fn diff(&self, path: &str, new: &str, old: &str) -> Result<String, GitError>;

    async fn pull(&self, remote: &str) -> Result<String, GitError>;

    async fn total_commits(&self) -> Result<u64, GitError>;

    async fn whatchanged(&self, skip: u64, max_count: u64) -> Result<Vec<Change>, GitError>;

    async fn commit(&self, path: &str, message: &str, author: &str) -> Result<(), GitError>;
}

pub struct Git {
    work_tree: PathBuf,
    branch: String,
}

impl Git {
    pub fn new(work_tree: impl Into<PathBuf>, branch: impl Into<String>) -> Git {
        Git {
            work_tree: work_tree.into(),
            branch: branch.into(),
        }
    }

    async fn output(&self, args: &[&str]) -> Result<Output, GitError> {
        tracing::debug!("git {}", args.join(" "));

        Ok(Command::new("git")
            .args(args)
            .current_dir(&self.work_tree)
            .kill_on_drop(true)
            .output()
            .await?)
    }

    async fn run(&self, args: &[&str]) -> Result<String, GitError> {
        let output = self.output(args).await?;

        if !output.status.success() {
            return Err(GitError::Command {
                command: args
                    .iter()
                    .find(|arg| !arg.starts_with('-') && !arg.contains('='))
                    .copied()
                    .unwrap_or_default()
                    .to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn has_commits(&self) -> Result<bool, GitError> {
        Ok(self
            .output(&["rev-parse", "--verify", "--quiet", "HEAD"])
            .await?
            .status
            .success())
    }
}

#[async_trait]
impl VersionControl for Git {
    async fn history(&self, path: &str) -> Result<Vec<HistoryEntry>, GitError> {
        if !self.has_commits().await? {
            return Ok(Vec::new());
        }

        let output = self
            .run(&["log", "--follow", "--shortstat", HISTORY_FORMAT, "--", path])
            .await?;

        Ok(parse_history(&output))
    }

    async fn version(&self, path: &str, revision: &str) -> Result<Option<String>, GitError> {
        let object = format!("{revision}:{path}");
        let output = self.output(&["show", &object]).await?;

        if output.status.success() {
            Ok(Some(String::from_utf8_lossy(&output.stdout).into_owned()))
        } else {
            tracing::debug!(
                "git show {} failed: {}",
                object,
                String::from_utf8_lossy(&output.stderr).trim()
            );
            Ok(None)
        }
    }

    async fn diff(&self, path: &str, new: &str, old: &str) -> Result<String, GitError> {
        let range = format!("{old}..{new}");
        self.run(&["diff", &range, "--", path]).await
    }

    async fn pull(&self, remote: &str) -> Result<String, GitError> {
        let output = self.output(&["pull", remote, &self.branch]).await?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            return Err(GitError::Command {
                command: String::from("pull"),
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(format!("{stdout}{stderr}"))
    }

    async fn total_commits(&self) -> Result<u64, GitError> {
        if !self.has_commits().await? {
            return Ok(0);
        }

        let output = self
            .run(&["rev-list", "--count", "--no-merges", "HEAD"])
            .await?;

        output
            .trim()
            .parse()
            .map_err(|_| GitError::Output(output.trim().to_string()))
    }

    async fn whatchanged(&self, skip: u64, max_count: u64) -> Result<Vec<Change>, GitError> {
        if !self.has_commits().await? {
            return Ok(Vec::new());
        }

        let skip = format!("--skip={skip}");
        let max_count = format!("--max-count={max_count}");
        let output = self
            .run(&[
                "log",
                "--no-merges",
                "--name-only",
                CHANGES_FORMAT,
                &skip,
                &max_count,
            ])
            .await?;

        Ok(parse_changes(&output))
    }

    async fn commit(&self, path: &str, message: &str, author: &str) -> Result<(), GitError> {
        self.run(&["add", "--", path]).await?;

        let staged = self
            .run(&["status", "--porcelain", "--", path])
            .await?;
        if staged.trim().is_empty() {
            tracing::debug!("nothing to commit for {}", path);
            return Ok(());
        }

        let name = format!("user.name={author}");
        let email = format!("user.email={author}@gitwiki");
        self.run(&["-c", &name, "-c", &email, "commit", "-m", message, "--", path])
            .await?;

        Ok(())
    }
}
