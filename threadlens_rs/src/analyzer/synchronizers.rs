//! Synchronizer registry: locks and monitors shared between threads.
//!
//! Threads only know synchronizer ids. The registry turns those ids into one
//! [`Synchronizer`] per id and records which threads hold, wait to acquire,
//! or wait for notification on each of them.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;

use super::deadlocks::DeadlockStatus;
use super::regexes::{regex_class_literal, regex_class_simple_name};
use super::thread::Thread;

/// One lock/monitor identity. Thread references are indices into
/// `Analysis::threads`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Synchronizer {
    pub id: String,
    pub class_name: Option<String>,
    pub lock_holder: Option<usize>,
    pub lock_waiters: Vec<usize>,
    pub notification_waiters: Vec<usize>,
    pub deadlock_status: DeadlockStatus,
}

impl Synchronizer {
    pub fn new(id: impl Into<String>, class_name: Option<String>) -> Self {
        Self {
            id: id.into(),
            class_name,
            lock_holder: None,
            lock_waiters: Vec::new(),
            notification_waiters: Vec::new(),
            deadlock_status: DeadlockStatus::no_risk(),
        }
    }

    /// Holder (if any) plus every waiter.
    pub fn thread_count(&self) -> usize {
        usize::from(self.lock_holder.is_some())
            + self.lock_waiters.len()
            + self.notification_waiters.len()
    }

    pub fn pretty_class_name(&self) -> Option<String> {
        self.class_name.as_deref().map(pretty_class_name)
    }
}

/// Short display form of a lock's class name.
///
/// `java.lang.Class for com.example.Foo` becomes `Foo.class`,
/// `java.util.concurrent.locks.ReentrantLock$NonfairSync` becomes
/// `ReentrantLock$NonfairSync`.
pub fn pretty_class_name(class_name: &str) -> String {
    if let Some(caps) = regex_class_literal().captures(class_name) {
        return format!("{}.class", &caps[1]);
    }
    if let Some(caps) = regex_class_simple_name().captures(class_name) {
        return caps[1].to_string();
    }
    class_name.to_string()
}

/// Ranking for reports: most severe first, then busiest, then by class name
/// and id.
pub fn compare_synchronizers(a: &Synchronizer, b: &Synchronizer) -> Ordering {
    b.deadlock_status
        .severity
        .cmp(&a.deadlock_status.severity)
        .then_with(|| b.thread_count().cmp(&a.thread_count()))
        .then_with(|| a.pretty_class_name().cmp(&b.pretty_class_name()))
        .then_with(|| a.id.cmp(&b.id))
}

/// Synchronizers in creation order plus an id lookup.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    pub synchronizers: Vec<Synchronizer>,
    pub index: HashMap<String, usize>,
}

impl Registry {
    fn register(&mut self, id: Option<&str>, thread: &Thread) {
        let Some(id) = id else {
            return;
        };
        if self.index.contains_key(id) {
            return;
        }
        let class_name = thread.synchronizer_classes.get(id).cloned();
        self.index.insert(id.to_string(), self.synchronizers.len());
        self.synchronizers.push(Synchronizer::new(id, class_name));
    }

    fn slot(&mut self, id: &str) -> Option<&mut Synchronizer> {
        let idx = *self.index.get(id)?;
        self.synchronizers.get_mut(idx)
    }
}

/// Create a synchronizer for every referenced id, then cross-reference
/// holders and waiters in thread order. Conflicting holder claims resolve to
/// the last thread that claims the lock.
pub(crate) fn build_registry(threads: &[Thread]) -> Registry {
    let mut registry = Registry::default();

    for thread in threads {
        registry.register(thread.want_notification_on.as_deref(), thread);
        registry.register(thread.want_to_acquire.as_deref(), thread);
        for lock in &thread.locks_held {
            registry.register(Some(lock), thread);
        }
    }

    for (idx, thread) in threads.iter().enumerate() {
        if let Some(sync) = thread
            .want_notification_on
            .as_deref()
            .and_then(|id| registry.slot(id))
        {
            sync.notification_waiters.push(idx);
        }
        if let Some(sync) = thread
            .want_to_acquire
            .as_deref()
            .and_then(|id| registry.slot(id))
        {
            sync.lock_waiters.push(idx);
        }
        for lock in &thread.locks_held {
            if let Some(sync) = registry.slot(lock) {
                sync.lock_holder = Some(idx);
            }
        }
    }

    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::deadlocks::Severity;

    fn thread(name: &str) -> Thread {
        Thread::new(name, format!("tid-{name}"))
    }

    #[test]
    fn pretty_names() {
        assert_eq!(
            pretty_class_name("java.lang.Class for com.example.Registry"),
            "Registry.class"
        );
        assert_eq!(
            pretty_class_name("java.util.concurrent.locks.ReentrantLock$NonfairSync"),
            "ReentrantLock$NonfairSync"
        );
        assert_eq!(pretty_class_name("Plain"), "Plain");
    }

    #[test]
    fn cross_references_holders_and_waiters() {
        let mut holder = thread("holder");
        holder.add_lock_held("0xa");
        holder
            .synchronizer_classes
            .insert("0xa".into(), "java.lang.Object".into());
        let mut blocked = thread("blocked");
        blocked.want_to_acquire = Some("0xa".into());
        let mut parked = thread("parked");
        parked.want_notification_on = Some("0xb".into());

        let registry = build_registry(&[holder, blocked, parked]);
        assert_eq!(registry.synchronizers.len(), 2);

        let a = &registry.synchronizers[registry.index["0xa"]];
        assert_eq!(a.lock_holder, Some(0));
        assert_eq!(a.lock_waiters, vec![1]);
        assert_eq!(a.class_name.as_deref(), Some("java.lang.Object"));
        assert_eq!(a.thread_count(), 2);

        let b = &registry.synchronizers[registry.index["0xb"]];
        assert_eq!(b.lock_holder, None);
        assert_eq!(b.notification_waiters, vec![2]);
        assert!(b.class_name.is_none());
    }

    #[test]
    fn last_holder_claim_wins() {
        let mut first = thread("first");
        first.add_lock_held("0xa");
        let mut second = thread("second");
        second.add_lock_held("0xa");

        let registry = build_registry(&[first, second]);
        assert_eq!(registry.synchronizers[0].lock_holder, Some(1));
    }

    #[test]
    fn creation_order_follows_threads() {
        let mut t = thread("t");
        t.want_notification_on = Some("0x3".into());
        t.want_to_acquire = Some("0x2".into());
        t.add_lock_held("0x1");

        let registry = build_registry(&[t]);
        let ids: Vec<&str> = registry.synchronizers.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["0x3", "0x2", "0x1"]);
    }

    #[test]
    fn ranking_prefers_severity_then_count() {
        let mut calm = Synchronizer::new("0x1", Some("a.B".into()));
        calm.lock_waiters = vec![1, 2, 3];
        let mut stuck = Synchronizer::new("0x2", Some("a.A".into()));
        stuck.deadlock_status = DeadlockStatus::new(Severity::Deadlocked);
        let quiet = Synchronizer::new("0x0", Some("a.C".into()));

        let mut all = [quiet, calm, stuck];
        all.sort_by(compare_synchronizers);
        let ids: Vec<&str> = all.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["0x2", "0x1", "0x0"]);
    }
}
