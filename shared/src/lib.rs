pub mod log;
pub mod markup;

use strum::{Display, EnumIter, EnumString};
use time::OffsetDateTime;

pub use log::{max_changes, parse_changes, parse_history, Change, HistoryEntry};
pub use markup::Markup;

pub const DEFAULT_PAGINATE_BY: u64 = 20;
pub const NBSP: char = '\u{a0}';
pub const TAB_WIDTH: usize = 4;

pub type UserId = i64;
pub type PageId = i64;
pub type Timestamp = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum Permission {
    ViewPage,
    AddPage,
    ChangePage,
}

impl Permission {
    /// Parses a comma separated list such as `view_page, change_page`.
    /// Unknown names are ignored.
    pub fn parse_list(list: &str) -> Vec<Permission> {
        let mut permissions = Vec::new();
        for name in list.split(',').map(str::trim).filter(|name| !name.is_empty()) {
            if let Ok(permission) = name.parse::<Permission>() {
                if !permissions.contains(&permission) {
                    permissions.push(permission);
                }
            }
        }
        permissions
    }
}

pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug.split('/').all(|segment| {
            !segment.is_empty()
                && segment.chars().all(|c| {
                    c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_'
                })
        })
}

pub fn slugify(text: &str) -> String {
    text.split('/')
        .map(|segment| {
            let mut slug = String::with_capacity(segment.len());
            for c in segment.chars().flat_map(char::to_lowercase) {
                if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' {
                    slug.push(c);
                } else if !slug.ends_with('-') {
                    slug.push('-');
                }
            }
            slug.trim_matches('-').to_string()
        })
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Abbreviated or full commit hashes as git prints them.
pub fn is_valid_revision(revision: &str) -> bool {
    (7..=40).contains(&revision.len())
        && revision
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
}

pub fn is_valid_remote(remote: &str) -> bool {
    !remote.is_empty() && remote.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Makes indentation survive HTML whitespace collapsing.
pub fn visible_whitespace(content: &str) -> String {
    let mut visible = String::with_capacity(content.len());
    for c in content.chars() {
        match c {
            '\t' => visible.extend(std::iter::repeat(NBSP).take(TAB_WIDTH)),
            ' ' => visible.push(NBSP),
            c => visible.push(c),
        }
    }
    visible
}

pub fn format_timestamp(timestamp: Timestamp) -> String {
    match OffsetDateTime::from_unix_timestamp(timestamp) {
        Ok(date) => format!(
            "{:04}-{:02}-{:02} {:02}:{:02}",
            date.year(),
            u8::from(date.month()),
            date.day(),
            date.hour(),
            date.minute()
        ),
        Err(_) => String::from("-"),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
}

impl Pagination {
    pub fn new(page: u64, per_page: u64, total: u64) -> Self {
        Pagination {
            page: page.max(1),
            per_page: per_page.max(1),
            total,
        }
    }

    pub fn skip(&self) -> u64 {
        (self.page - 1).saturating_mul(self.per_page)
    }

    pub fn prev(&self) -> Option<u64> {
        if self.page > 1 {
            Some(self.page - 1)
        } else {
            None
        }
    }

    // total / per_page > page, without the float division. Saturates for
    // page numbers past the end of any log.
    pub fn next(&self) -> Option<u64> {
        if self.total > self.page.saturating_mul(self.per_page) {
            Some(self.page + 1)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs() {
        assert!(is_valid_slug("home"));
        assert!(is_valid_slug("docs/getting-started_2"));
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("docs//intro"));
        assert!(!is_valid_slug("/docs"));
        assert!(!is_valid_slug("Docs"));
        assert!(!is_valid_slug("../etc/passwd"));
    }

    #[test]
    fn slugify_paths() {
        assert_eq!(slugify("Getting Started"), "getting-started");
        assert_eq!(slugify("docs/How To: Pull!"), "docs/how-to-pull");
        assert_eq!(slugify("snake_case"), "snake_case");
        assert_eq!(slugify("--x--"), "x");
    }

    #[test]
    fn revisions() {
        assert!(is_valid_revision("abc1234"));
        assert!(is_valid_revision("0123456789abcdef0123456789abcdef01234567"));
        assert!(!is_valid_revision("abc123"));
        assert!(!is_valid_revision("ABC1234"));
        assert!(!is_valid_revision("--output=x"));
        assert!(!is_valid_revision("0123456789abcdef0123456789abcdef012345678"));
    }

    #[test]
    fn remotes() {
        assert!(is_valid_remote("origin"));
        assert!(is_valid_remote("upstream2"));
        assert!(!is_valid_remote(""));
        assert!(!is_valid_remote("-u"));
        assert!(!is_valid_remote("a/b"));
    }

    #[test]
    fn whitespace_is_made_visible() {
        assert_eq!(visible_whitespace("a b"), "a\u{a0}b");
        assert_eq!(visible_whitespace("\tx"), "\u{a0}\u{a0}\u{a0}\u{a0}x");
        assert_eq!(visible_whitespace("line\nnext"), "line\nnext");
    }

    #[test]
    fn permission_lists() {
        assert_eq!(
            Permission::parse_list("view_page, change_page,,bogus,view_page"),
            vec![Permission::ViewPage, Permission::ChangePage]
        );
        assert_eq!(Permission::AddPage.to_string(), "add_page");
        assert!(Permission::parse_list("").is_empty());
    }

    #[test]
    fn timestamps() {
        assert_eq!(format_timestamp(0), "1970-01-01 00:00");
        assert_eq!(format_timestamp(1_700_000_000), "2023-11-14 22:13");
    }

    #[test]
    fn pagination() {
        let first = Pagination::new(1, 20, 45);
        assert_eq!(first.skip(), 0);
        assert_eq!(first.prev(), None);
        assert_eq!(first.next(), Some(2));

        let last = Pagination::new(3, 20, 45);
        assert_eq!(last.skip(), 40);
        assert_eq!(last.prev(), Some(2));
        assert_eq!(last.next(), None);

        let exact = Pagination::new(2, 20, 40);
        assert_eq!(exact.next(), None);

        assert_eq!(Pagination::new(0, 20, 5).page, 1);

        let huge = Pagination::new(u64::MAX, 20, 45);
        assert_eq!(huge.skip(), u64::MAX);
        assert_eq!(huge.prev(), Some(u64::MAX - 1));
        assert_eq!(huge.next(), None);
    }
}
