//! The complete registry view and its persisted text layout.
//!
//! The persisted form is line oriented, one `<host> <port> <lastSeen>` record
//! per line. Older writers prefixed the file with an entry count; that line
//! is tolerated but never trusted. Parsing is lenient: a line that does not
//! parse is a [`RecordError`], which the reader logs and skips, because
//! files written by legacy tools may end in a partially written line.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::net::IpAddr;

use super::{ServerEntry, ServerId};

/// Reason a persisted line was rejected. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    /// The line did not have exactly three fields.
    #[error("expected 3 fields, found {0}")]
    FieldCount(usize),

    /// The host field is not an IP address.
    #[error("invalid host field: {0:?}")]
    InvalidHost(String),

    /// The port field is not an integer in `1..=65535`.
    #[error("invalid port field: {0:?}")]
    InvalidPort(String),

    /// The timestamp field is not an integer.
    #[error("invalid last-seen field: {0:?}")]
    InvalidTimestamp(String),
}

/// Ordered list of registry entries, in persisted order.
///
/// Order carries no meaning beyond being stable across one read/write
/// cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    entries: Vec<ServerEntry>,
}

impl Snapshot {
    /// Creates an empty snapshot.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Builds a snapshot from entries, collapsing duplicate identities.
    ///
    /// The surviving entry for a key sits at the position of the key's
    /// first occurrence and carries the greatest `last_seen` seen for it.
    #[must_use]
    pub fn from_entries(entries: impl IntoIterator<Item = ServerEntry>) -> Self {
        let mut index: HashMap<ServerId, usize> = HashMap::new();
        let mut out: Vec<ServerEntry> = Vec::new();
        for entry in entries {
            if let Some(&pos) = index.get(&entry.id) {
                if let Some(existing) = out.get_mut(pos)
                    && entry.last_seen > existing.last_seen
                {
                    existing.last_seen = entry.last_seen;
                }
                continue;
            }
            index.insert(entry.id.clone(), out.len());
            out.push(entry);
        }
        Self { entries: out }
    }

    /// Parses the persisted text, skipping lines that do not parse.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut entries = Vec::new();
        let mut first_record = true;
        for (lineno, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let leading = std::mem::replace(&mut first_record, false);
            if leading && is_count_line(line) {
                continue;
            }
            match parse_record(line) {
                Ok(entry) => entries.push(entry),
                Err(err) => {
                    tracing::debug!(line = lineno + 1, error = %err, "skipping malformed record");
                }
            }
        }
        Self::from_entries(entries)
    }

    /// Serializes the snapshot to the persisted text layout.
    #[must_use]
    pub fn serialize(&self) -> String {
        let mut out = String::with_capacity(self.entries.len() * 32);
        for entry in &self.entries {
            let _ = writeln!(
                out,
                "{} {} {}",
                entry.id.host(),
                entry.id.port(),
                entry.last_seen
            );
        }
        out
    }

    /// Renders the client-visible directory: the entry count on the first
    /// line, then one `<host> <port>` line per entry. `last_seen` is never
    /// disclosed.
    #[must_use]
    pub fn render_directory(&self) -> String {
        let mut out = String::with_capacity(8 + self.entries.len() * 24);
        let _ = writeln!(out, "{}", self.entries.len());
        for entry in &self.entries {
            let _ = writeln!(out, "{}", entry.id);
        }
        out
    }

    /// Returns the entries in order.
    #[must_use]
    pub fn entries(&self) -> &[ServerEntry] {
        &self.entries
    }

    /// Looks up the entry for an identity.
    #[must_use]
    pub fn get(&self, id: &ServerId) -> Option<&ServerEntry> {
        self.entries.iter().find(|e| &e.id == id)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn into_entries(self) -> Vec<ServerEntry> {
        self.entries
    }
}

fn is_count_line(line: &str) -> bool {
    !line.contains(char::is_whitespace) && line.parse::<u64>().is_ok()
}

/// Parses one `<host> <port> <lastSeen>` line.
///
/// # Errors
///
/// Returns a [`RecordError`] describing the first field that failed.
pub fn parse_record(line: &str) -> Result<ServerEntry, RecordError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let [host, port, last_seen] = fields.as_slice() else {
        return Err(RecordError::FieldCount(fields.len()));
    };
    let ip = host
        .parse::<IpAddr>()
        .map_err(|_| RecordError::InvalidHost((*host).to_string()))?;
    let port = port
        .parse::<u16>()
        .ok()
        .filter(|p| *p != 0)
        .ok_or_else(|| RecordError::InvalidPort((*port).to_string()))?;
    let last_seen = last_seen
        .parse::<i64>()
        .map_err(|_| RecordError::InvalidTimestamp((*last_seen).to_string()))?;
    Ok(ServerEntry::new(ServerId::from_ip(ip, port), last_seen))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn entry(host: &str, port: u16, last_seen: i64) -> ServerEntry {
        ServerEntry::new(ServerId::new(host, port), last_seen)
    }

    #[test]
    fn serialize_then_parse_keeps_entries() {
        let snapshot = Snapshot::from_entries([
            entry("1.2.3.4", 1000, 10),
            entry("5.6.7.8", 2000, 20),
            entry("::1", 27910, 30),
        ]);
        let parsed = Snapshot::parse(&snapshot.serialize());

        let mut left: Vec<_> = snapshot.entries().to_vec();
        let mut right: Vec<_> = parsed.entries().to_vec();
        left.sort_by(|a, b| a.id.host().cmp(b.id.host()));
        right.sort_by(|a, b| a.id.host().cmp(b.id.host()));
        assert_eq!(left, right);
    }

    #[test]
    fn leading_count_line_is_ignored() {
        let parsed = Snapshot::parse("7\n1.2.3.4 1000 10\n");
        assert_eq!(parsed.len(), 1);
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let text = "1.2.3.4 1000 10\n\
                    garbage\n\
                    5.6.7.8 notaport 20\n\
                    5.6.7.8 0 20\n\
                    5.6.7.8 70000 20\n\
                    9.9.9.9 3000 yesterday\n\
                    1.1.1.1 4000 40 extra\n\
                    2.2.2.2 5000";
        let parsed = Snapshot::parse(text);
        assert_eq!(parsed.entries(), &[entry("1.2.3.4", 1000, 10)]);
    }

    #[test]
    fn count_line_in_the_middle_is_malformed() {
        let parsed = Snapshot::parse("1.2.3.4 1000 10\n3\n");
        assert_eq!(parsed.len(), 1);
    }

    #[test]
    fn duplicates_collapse_to_latest_at_first_position() {
        let parsed = Snapshot::parse(
            "1.2.3.4 1000 10\n5.6.7.8 2000 20\n1.2.3.4 1000 50\n1.2.3.4 1000 5\n",
        );
        assert_eq!(
            parsed.entries(),
            &[entry("1.2.3.4", 1000, 50), entry("5.6.7.8", 2000, 20)]
        );
    }

    #[test]
    fn directory_hides_timestamps() {
        let snapshot = Snapshot::from_entries([entry("5.6.7.8", 2000, 100)]);
        assert_eq!(snapshot.render_directory(), "1\n5.6.7.8 2000\n");
    }

    #[test]
    fn empty_directory_is_zero() {
        assert_eq!(Snapshot::new().render_directory(), "0\n");
    }

    #[test]
    fn parse_record_reports_field() {
        assert_eq!(parse_record("a b"), Err(RecordError::FieldCount(2)));
        assert_eq!(
            parse_record("a 1 1"),
            Err(RecordError::InvalidHost("a".to_string()))
        );
        assert_eq!(
            parse_record("1.2.3.4 x 1"),
            Err(RecordError::InvalidPort("x".to_string()))
        );
        assert_eq!(
            parse_record("1.2.3.4 1 x"),
            Err(RecordError::InvalidTimestamp("x".to_string()))
        );
    }

    #[test]
    fn non_address_hosts_are_never_published() {
        let bytes = b"\xff\xfe 1000 42\nnot-an-address 2000 42\nexample.org 3000 42\n";
        let parsed = Snapshot::parse(&String::from_utf8_lossy(bytes));
        assert!(parsed.is_empty());
        assert_eq!(parsed.render_directory(), "0\n");
    }

    #[test]
    fn stored_hosts_are_normalized() {
        let parsed = Snapshot::parse("::ffff:1.2.3.4 1000 10\n1.2.3.4 1000 20\n");
        assert_eq!(parsed.entries(), &[entry("1.2.3.4", 1000, 20)]);
    }
}
