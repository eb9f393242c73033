//! Parsed thread records.
//!
//! A [`Thread`] is created from one (possibly re-joined) header line and then
//! fed the stack lines that follow it. Lock annotations are kept as raw
//! synchronizer ids; the shared [`Synchronizer`](super::synchronizers::Synchronizer)
//! entities are built afterwards from these ids.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::Serialize;

/// One thread of a thread dump.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Thread {
    pub name: String,
    /// Always populated: either the dump's own id or a `generated-id-<n>` placeholder.
    pub tid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_prio: Option<String>,
    pub daemon: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Trailing `[0x...]` blob of the header (last known Java stack pointer).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_sp: Option<String>,
    /// Header remainder once every known field has been cut out, e.g. `runnable`.
    pub state: String,
    /// Value of the `java.lang.Thread.State:` line.
    pub thread_state: Option<String>,
    /// Innermost frame first.
    pub frames: Vec<String>,
    pub synchronizer_classes: BTreeMap<String, String>,
    pub want_notification_on: Option<String>,
    pub want_to_acquire: Option<String>,
    /// Monitor held by a legacy `Object.wait()` caller.
    pub classical_lock_held: Option<String>,
    /// Held synchronizer ids in encounter order, without duplicates.
    pub locks_held: Vec<String>,
}

impl Thread {
    pub fn new(name: impl Into<String>, tid: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tid: tid.into(),
            ..Default::default()
        }
    }

    /// Add `id` to the held locks unless it is already there.
    pub fn add_lock_held(&mut self, id: &str) {
        if !self.locks_held.iter().any(|held| held == id) {
            self.locks_held.push(id.to_string());
        }
    }

    /// Mark the thread as parked on `id`.
    ///
    /// A monitor the thread is waiting on has been released by `wait()`, so it
    /// is no longer held, classically or otherwise.
    pub fn set_want_notification_on(&mut self, id: &str) {
        self.want_notification_on = Some(id.to_string());
        self.locks_held.retain(|held| held != id);
        if self.classical_lock_held.as_deref() == Some(id) {
            self.classical_lock_held = None;
        }
    }

    pub fn holds(&self, id: &str) -> bool {
        self.locks_held.iter().any(|held| held == id)
    }

    /// Top of the stack, if any.
    pub fn top_frame(&self) -> Option<&str> {
        self.frames.first().map(String::as_str)
    }
}

/// Display ordering for threads: by name, then by tid.
pub fn compare_threads(a: &Thread, b: &Thread) -> Ordering {
    a.name.cmp(&b.name).then_with(|| a.tid.cmp(&b.tid))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_lock_held_is_unique() {
        let mut thread = Thread::new("worker", "0x1");
        thread.add_lock_held("0xa");
        thread.add_lock_held("0xb");
        thread.add_lock_held("0xa");
        assert_eq!(thread.locks_held, vec!["0xa", "0xb"]);
    }

    #[test]
    fn want_notification_releases_lock() {
        let mut thread = Thread::new("worker", "0x1");
        thread.add_lock_held("0xa");
        thread.add_lock_held("0xb");
        thread.classical_lock_held = Some("0xa".to_string());

        thread.set_want_notification_on("0xa");

        assert_eq!(thread.want_notification_on.as_deref(), Some("0xa"));
        assert_eq!(thread.locks_held, vec!["0xb"]);
        assert!(thread.classical_lock_held.is_none());
        assert!(!thread.holds("0xa"));
    }

    #[test]
    fn ordering_uses_name_then_tid() {
        let a = Thread::new("alpha", "0x2");
        let b = Thread::new("alpha", "0x1");
        let c = Thread::new("beta", "0x0");
        assert_eq!(compare_threads(&a, &b), Ordering::Greater);
        assert_eq!(compare_threads(&b, &c), Ordering::Less);
        assert_eq!(compare_threads(&a, &a.clone()), Ordering::Equal);
    }
}
