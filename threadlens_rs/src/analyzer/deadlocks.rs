//! Deadlock detection over the wait-for graph.
//!
//! Edges run from a blocked thread to the lock it wants, and from a lock to
//! the thread holding it. Each synchronizer is judged on its own by walking
//! that graph from its holder; the analysis-wide status is the most severe
//! synchronizer status.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::Serialize;

use super::status::{ThreadStatus, classify};
use super::synchronizers::Synchronizer;
use super::thread::Thread;

/// Deadlock risk, ordered from harmless to certain.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    #[default]
    NoRisk = 0,
    LowRisk = 1,
    HighRisk = 2,
    Deadlocked = 3,
}

impl Severity {
    pub fn value(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            Severity::NoRisk => "No deadlock",
            Severity::LowRisk => "Deadlock suspect",
            Severity::HighRisk => "Possible deadlock",
            Severity::Deadlocked => "Deadlocked",
        }
    }

    /// Alert class for UIs: empty, info, warning or danger.
    pub fn notification_level(self) -> &'static str {
        match self {
            Severity::NoRisk => "",
            Severity::LowRisk => "info",
            Severity::HighRisk => "warning",
            Severity::Deadlocked => "danger",
        }
    }
}

/// Outcome of deadlock analysis for one synchronizer or a whole snapshot.
///
/// A plain value: every synchronizer owns its own copy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeadlockStatus {
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Cycle path. Not populated by the current detector.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub trail: Vec<String>,
}

impl DeadlockStatus {
    pub fn new(severity: Severity) -> Self {
        Self {
            severity,
            detail: None,
            trail: Vec::new(),
        }
    }

    pub fn no_risk() -> Self {
        Self::new(Severity::NoRisk)
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn is_no_risk(&self) -> bool {
        self.severity == Severity::NoRisk
    }
}

impl fmt::Display for DeadlockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{} ({})", self.severity.label(), detail),
            None => f.write_str(self.severity.label()),
        }
    }
}

pub(crate) const UNKNOWN_NOTIFIER_DETAIL: &str = "waiting for notification on unknown object.";

/// Judge a single synchronizer.
pub fn determine_status(
    sync: &Synchronizer,
    threads: &[Thread],
    synchronizers: &[Synchronizer],
    index: &HashMap<String, usize>,
) -> DeadlockStatus {
    let Some(holder_idx) = sync.lock_holder else {
        if sync.lock_waiters.is_empty() {
            return DeadlockStatus::no_risk();
        }
        // Waiters on a lock nobody in the dump holds.
        return DeadlockStatus::new(Severity::Deadlocked);
    };
    let holder = &threads[holder_idx];
    let holder_status = classify(holder);

    if holder_status == ThreadStatus::AwaitingNotification && holder.want_notification_on.is_none()
    {
        return DeadlockStatus::new(Severity::HighRisk).with_detail(UNKNOWN_NOTIFIER_DETAIL);
    }
    if !holder_status.is_waiting() {
        return DeadlockStatus::no_risk();
    }
    if sync.lock_waiters.is_empty() && sync.notification_waiters.is_empty() {
        return DeadlockStatus::no_risk();
    }

    let mut visited: HashSet<&str> = HashSet::new();
    visited.insert(sync.id.as_str());
    let mut work = vec![holder_idx];

    while let Some(idx) = work.pop() {
        let thread = &threads[idx];
        if thread.want_notification_on.is_some() {
            return DeadlockStatus::new(Severity::HighRisk);
        }
        let Some(wanted) = thread.want_to_acquire.as_deref() else {
            continue;
        };
        if !visited.insert(wanted) {
            return DeadlockStatus::new(Severity::Deadlocked);
        }
        let next_holder = index
            .get(wanted)
            .and_then(|&i| synchronizers.get(i))
            .and_then(|next| next.lock_holder);
        if let Some(next_holder) = next_holder {
            work.push(next_holder);
        }
    }

    // Every thread on the chain is blocked and nothing resolved it.
    DeadlockStatus::new(Severity::Deadlocked)
}

/// Judge every synchronizer, store the non-trivial results on them and return
/// the most severe one. Ties keep the earliest synchronizer.
pub fn analyze_deadlocks(
    threads: &[Thread],
    synchronizers: &mut [Synchronizer],
    index: &HashMap<String, usize>,
) -> DeadlockStatus {
    let statuses: Vec<DeadlockStatus> = {
        let all: &[Synchronizer] = synchronizers;
        all.iter()
            .map(|sync| determine_status(sync, threads, all, index))
            .collect()
    };

    let mut overall = DeadlockStatus::no_risk();
    for (sync, status) in synchronizers.iter_mut().zip(statuses) {
        if status.is_no_risk() {
            continue;
        }
        if overall.severity < status.severity {
            overall = status.clone();
        }
        sync.deadlock_status = status;
    }
    overall
}
