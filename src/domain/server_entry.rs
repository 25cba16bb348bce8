//! A registered game server with its liveness timestamp.

use super::ServerId;

/// One row of the registry: a server identity and the time (seconds since
/// the Unix epoch) it was last accepted by a `ping` or `heartbeat`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerEntry {
    /// Identity key.
    pub id: ServerId,
    /// Wall-clock seconds of the last accepted ping or heartbeat.
    pub last_seen: i64,
}

impl ServerEntry {
    /// Creates an entry seen at `last_seen`.
    #[must_use]
    pub const fn new(id: ServerId, last_seen: i64) -> Self {
        Self { id, last_seen }
    }

    /// Returns `true` if the entry is still live at `now` for the given
    /// timeout. An entry exactly `timeout` seconds old is still live.
    #[must_use]
    pub fn is_live(&self, now: i64, timeout_secs: i64) -> bool {
        now.saturating_sub(self.last_seen) <= timeout_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn liveness_boundary_is_inclusive() {
        let entry = ServerEntry::new(ServerId::new("1.2.3.4", 1000), 0);
        assert!(entry.is_live(300, 300));
        assert!(!entry.is_live(301, 300));
    }

    #[test]
    fn future_timestamps_count_as_live() {
        let entry = ServerEntry::new(ServerId::new("1.2.3.4", 1000), 500);
        assert!(entry.is_live(100, 300));
    }
}
