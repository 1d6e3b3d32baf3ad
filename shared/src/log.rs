use crate::{format_timestamp, Timestamp};

pub const RECORD_SEPARATOR: char = '\u{1e}';
pub const FIELD_SEPARATOR: char = '\u{1f}';

/// `git log` format consumed by [`parse_history`].
pub const HISTORY_FORMAT: &str = "--format=%x1e%h%x1f%an%x1f%at%x1f%s";
/// `git log` format consumed by [`parse_changes`].
pub const CHANGES_FORMAT: &str = "--format=%x1e%an%x1f%ae%x1f%h%x1f%s%x1f%at";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HistoryEntry {
    pub version: String,
    pub author: String,
    pub timestamp: Timestamp,
    pub message: String,
    pub insertion: u64,
    pub deletion: u64,
}

impl HistoryEntry {
    pub fn changes(&self) -> u64 {
        self.insertion + self.deletion
    }

    pub fn date(&self) -> String {
        format_timestamp(self.timestamp)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Change {
    pub author: String,
    pub email: String,
    pub version: String,
    pub message: String,
    pub timestamp: Timestamp,
    pub paths: Vec<String>,
}

impl Change {
    pub fn date(&self) -> String {
        format_timestamp(self.timestamp)
    }
}

pub fn max_changes(history: &[HistoryEntry]) -> u64 {
    history.iter().map(HistoryEntry::changes).max().unwrap_or(0)
}

pub fn parse_history(output: &str) -> Vec<HistoryEntry> {
    records(output)
        .filter_map(|(header, body)| {
            let mut fields = header.split(FIELD_SEPARATOR);
            let version = fields.next()?.trim().to_string();
            let author = fields.next()?.to_string();
            let timestamp = fields.next()?.trim().parse().ok()?;
            let message = fields.next().unwrap_or_default().to_string();

            let (insertion, deletion) = body
                .lines()
                .find(|line| line.contains("changed"))
                .map(parse_shortstat)
                .unwrap_or((0, 0));

            Some(HistoryEntry {
                version,
                author,
                timestamp,
                message,
                insertion,
                deletion,
            })
        })
        .collect()
}

pub fn parse_changes(output: &str) -> Vec<Change> {
    records(output)
        .filter_map(|(header, body)| {
            let mut fields = header.split(FIELD_SEPARATOR);
            let author = fields.next()?.to_string();
            let email = fields.next()?.to_string();
            let version = fields.next()?.trim().to_string();
            let message = fields.next()?.to_string();
            let timestamp = fields.next()?.trim().parse().ok()?;

            let paths = body
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(String::from)
                .collect();

            Some(Change {
                author,
                email,
                version,
                message,
                timestamp,
                paths,
            })
        })
        .collect()
}

// Splits log output into (header line, remaining lines) per commit.
fn records(output: &str) -> impl Iterator<Item = (&str, &str)> {
    output
        .split(RECORD_SEPARATOR)
        .filter(|record| !record.trim().is_empty())
        .map(|record| record.split_once('\n').unwrap_or((record, "")))
}

// " 1 file changed, 3 insertions(+), 1 deletion(-)"
fn parse_shortstat(line: &str) -> (u64, u64) {
    let mut insertion = 0;
    let mut deletion = 0;
    for part in line.split(',') {
        let mut words = part.split_whitespace();
        let count = words.next().and_then(|n| n.parse::<u64>().ok());
        let kind = words.next().unwrap_or_default();
        match count {
            Some(n) if kind.starts_with("insertion") => insertion = n,
            Some(n) if kind.starts_with("deletion") => deletion = n,
            _ => {}
        }
    }
    (insertion, deletion)
}
