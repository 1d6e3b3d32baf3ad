use crate::git::{Git, VersionControl};
use std::process::Command;
use tempfile::TempDir;

// Runs against the real git binary; machines without one skip these.
fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

fn init_repo() -> TempDir {
    let dir = TempDir::new().unwrap();
    let status = Command::new("git")
        .args(["init", "-q"])
        .current_dir(dir.path())
        .status()
        .unwrap();
    assert!(status.success());
    dir
}

async fn repo_with_two_commits() -> (TempDir, Git) {
    let dir = init_repo();
    let git = Git::new(dir.path(), "master");

    std::fs::write(dir.path().join("home.md"), "old\n").unwrap();
    git.commit("home.md", "Add home", "alice").await.unwrap();

    std::fs::write(dir.path().join("home.md"), "new\n").unwrap();
    git.commit("home.md", "Edit home", "bob").await.unwrap();

    (dir, git)
}

#[tokio::test]
async fn test_history_lists_revisions_newest_first() {
    if !git_available() {
        return;
    }
    let (_dir, git) = repo_with_two_commits().await;

    let history = git.history("home.md").await.unwrap();

    assert_eq!(history.len(), 2);
    assert_eq!(history[0].message, "Edit home");
    assert_eq!(history[0].author, "bob");
    assert_eq!((history[0].insertion, history[0].deletion), (1, 1));
    assert_eq!(history[1].message, "Add home");
    assert_eq!((history[1].insertion, history[1].deletion), (1, 0));
    assert!(shared::is_valid_revision(&history[0].version));
}

#[tokio::test]
async fn test_versions_and_diffs() {
    if !git_available() {
        return;
    }
    let (_dir, git) = repo_with_two_commits().await;
    let history = git.history("home.md").await.unwrap();
    let (new, old) = (&history[0].version, &history[1].version);

    let content = git.version("home.md", old).await.unwrap();
    assert_eq!(content.as_deref(), Some("old\n"));

    assert_eq!(git.version("home.md", "deadbee").await.unwrap(), None);
    assert_eq!(git.version("missing.md", new).await.unwrap(), None);

    let diff = git.diff("home.md", new, old).await.unwrap();
    assert!(diff.contains("-old"));
    assert!(diff.contains("+new"));
}

#[tokio::test]
async fn test_whatchanged_pages_through_commits() {
    if !git_available() {
        return;
    }
    let (_dir, git) = repo_with_two_commits().await;

    assert_eq!(git.total_commits().await.unwrap(), 2);

    let changes = git.whatchanged(0, 10).await.unwrap();
    assert_eq!(changes.len(), 2);
    assert_eq!(changes[0].message, "Edit home");
    assert_eq!(changes[0].email, "bob@gitwiki");
    assert_eq!(changes[0].paths, vec!["home.md"]);

    let changes = git.whatchanged(1, 10).await.unwrap();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].author, "alice");
}

#[tokio::test]
async fn test_commit_without_changes_does_nothing() {
    if !git_available() {
        return;
    }
    let (_dir, git) = repo_with_two_commits().await;

    git.commit("home.md", "Nothing new", "carol").await.unwrap();

    assert_eq!(git.total_commits().await.unwrap(), 2);
}

#[tokio::test]
async fn test_empty_repository() {
    if !git_available() {
        return;
    }
    let dir = init_repo();
    let git = Git::new(dir.path(), "master");

    assert_eq!(git.total_commits().await.unwrap(), 0);
    assert!(git.history("home.md").await.unwrap().is_empty());
    assert!(git.whatchanged(0, 20).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_pull_from_unknown_remote_fails() {
    if !git_available() {
        return;
    }
    let (_dir, git) = repo_with_two_commits().await;

    let err = git.pull("nowhere").await.unwrap_err();

    assert!(err.to_string().starts_with("git pull failed"));
}
