//! Registry state transitions as pure functions over a [`Snapshot`].
//!
//! Every operation, `query` included, first drops entries whose
//! `last_seen` is older than the liveness timeout and then applies its own
//! rule to the caller's entry. The resulting snapshot is what gets persisted
//! and what the client sees.

use std::fmt;
use std::str::FromStr;

use super::{ServerEntry, ServerId, Snapshot};

/// The four protocol operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Refresh an existing entry.
    Heartbeat,
    /// Register or refresh an entry.
    Ping,
    /// Withdraw an entry.
    Shutdown,
    /// Read the live set.
    Query,
}

impl Operation {
    /// All operations in selector precedence order.
    pub const ALL: [Self; 4] = [Self::Heartbeat, Self::Ping, Self::Shutdown, Self::Query];

    /// Wire name of the operation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Heartbeat => "heartbeat",
            Self::Ping => "ping",
            Self::Shutdown => "shutdown",
            Self::Query => "query",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|op| op.as_str() == s).ok_or(())
    }
}

/// What a `heartbeat` from an unregistered identity does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HeartbeatPolicy {
    /// Heartbeats only refresh; an unknown identity is ignored.
    #[default]
    RefreshOnly,
    /// Heartbeats from unknown identities register them, like `ping`.
    Register,
}

/// Parameters of the transition rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryRules {
    /// Maximum age in seconds before an entry expires.
    pub timeout_secs: i64,
    /// Heartbeat handling for unknown identities.
    pub heartbeat_policy: HeartbeatPolicy,
}

/// A single state change applied while computing the next snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// The caller was absent and is now registered.
    Registered(ServerId),
    /// The caller's `last_seen` was updated.
    Refreshed(ServerId),
    /// The caller was removed by `shutdown`.
    Withdrawn(ServerId),
    /// An entry exceeded the liveness timeout and was dropped.
    Expired(ServerId),
    /// The operation had no effect on the caller (heartbeat or shutdown
    /// from an absent identity).
    Ignored(ServerId),
}

/// Result of applying one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Snapshot to persist and publish.
    pub snapshot: Snapshot,
    /// Changes applied, in the order they happened.
    pub transitions: Vec<Transition>,
}

/// Applies `op` from `caller` at time `now` to `current`.
#[must_use]
pub fn apply(
    current: Snapshot,
    op: Operation,
    caller: &ServerId,
    now: i64,
    rules: &RegistryRules,
) -> Outcome {
    let mut transitions = Vec::new();
    let mut entries = Vec::with_capacity(current.len().saturating_add(1));
    let mut caller_present = false;

    for entry in current.into_entries() {
        if !entry.is_live(now, rules.timeout_secs) {
            transitions.push(Transition::Expired(entry.id));
            continue;
        }
        if entry.id != *caller {
            entries.push(entry);
            continue;
        }
        caller_present = true;
        match op {
            Operation::Ping | Operation::Heartbeat => {
                transitions.push(Transition::Refreshed(entry.id.clone()));
                entries.push(ServerEntry::new(entry.id, now));
            }
            Operation::Shutdown => transitions.push(Transition::Withdrawn(entry.id)),
            Operation::Query => entries.push(entry),
        }
    }

    if !caller_present {
        let registers = match op {
            Operation::Ping => true,
            Operation::Heartbeat => rules.heartbeat_policy == HeartbeatPolicy::Register,
            Operation::Shutdown | Operation::Query => false,
        };
        if registers {
            transitions.push(Transition::Registered(caller.clone()));
            entries.push(ServerEntry::new(caller.clone(), now));
        } else if op != Operation::Query {
            transitions.push(Transition::Ignored(caller.clone()));
        }
    }

    Outcome {
        snapshot: Snapshot::from_entries(entries),
        transitions,
    }
}
