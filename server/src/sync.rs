use crate::{model::Page, ServerError};
use shared::{is_valid_slug, slugify, Markup};
use sqlx::SqlitePool;
use std::collections::{HashMap, HashSet};
use std::fmt::Write;
use std::path::Path;
use walkdir::WalkDir;

/// Brings the page index in line with the files in the data dir and returns
/// a log of what changed.
pub async fn sync_pages(pool: &SqlitePool, data_dir: &Path) -> Result<String, ServerError> {
    let root = data_dir.to_path_buf();
    let files = tokio::task::spawn_blocking(move || page_files(&root)).await?;

    let pages = Page::all(pool).await?;
    let mut known_paths: HashSet<String> = pages.iter().map(|page| page.path.clone()).collect();
    let mut slugs: HashMap<String, String> = pages
        .iter()
        .map(|page| (page.slug.clone(), page.path.clone()))
        .collect();

    let mut log = String::new();

    for (path, markup) in &files {
        if known_paths.contains(path) {
            continue;
        }

        let slug = slugify(&strip_extension(path));
        if !is_valid_slug(&slug) {
            tracing::warn!("no usable slug for {}", path);
            writeln!(log, "skipped {path}: no usable slug").ok();
            continue;
        }
        if let Some(owner) = slugs.get(&slug) {
            tracing::warn!("slug {} of {} already belongs to {}", slug, path, owner);
            writeln!(log, "skipped {path}: slug {slug} already used by {owner}").ok();
            continue;
        }

        let page = Page::create(pool, &slug, path, &title_for(path), *markup).await?;
        tracing::info!("created page {} ({})", page.slug, page.path);
        writeln!(log, "created page {} ({})", page.slug, page.path).ok();

        known_paths.insert(page.path.clone());
        slugs.insert(page.slug, page.path);
    }

    let on_disk: HashSet<&String> = files.iter().map(|(path, _)| path).collect();
    for page in pages.iter().filter(|page| !on_disk.contains(&page.path)) {
        page.delete(pool).await?;
        tracing::info!("removed page {} ({} missing)", page.slug, page.path);
        writeln!(log, "removed page {} ({} missing)", page.slug, page.path).ok();
    }

    if log.is_empty() {
        log.push_str("nothing to do\n");
    }

    Ok(log)
}

// Relative, slash separated paths of every file with a known markup.
fn page_files(root: &Path) -> Vec<(String, Markup)> {
    let mut files = Vec::new();

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.file_name() != ".git");

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!("skipping unreadable entry: {}", err);
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let markup = match entry
            .path()
            .extension()
            .and_then(|extension| extension.to_str())
            .and_then(Markup::from_extension)
        {
            Some(markup) => markup,
            None => continue,
        };

        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        files.push((relative.to_string_lossy().replace('\\', "/"), markup));
    }

    files
}

fn strip_extension(path: &str) -> String {
    Path::new(path)
        .with_extension("")
        .to_string_lossy()
        .replace('\\', "/")
}

fn title_for(path: &str) -> String {
    let stem = Path::new(path)
        .file_stem()
        .map(|stem| stem.to_string_lossy().replace(['-', '_'], " "))
        .unwrap_or_default();

    let mut chars = stem.trim().chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::from(path),
    }
}
