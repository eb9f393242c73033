//! Thread dump analysis.
//!
//! [`Analysis::analyze`] runs the whole pipeline over one snapshot:
//!
//! 1. parse headers and stack lines into [`Thread`] records ([`parser`])
//! 2. group threads into configured pools ([`pools`])
//! 3. bucket threads by [`ThreadStatus`] ([`status`])
//! 4. tally the top frame of every running thread
//! 5. build the [`Synchronizer`] registry ([`synchronizers`])
//! 6. judge deadlock risk per synchronizer ([`deadlocks`])
//!
//! The analysis is pure: no I/O, no shared state, and it never fails on
//! malformed input.

pub mod counter;
pub mod deadlocks;
mod header;
mod parser;
pub mod pools;
pub(crate) mod regexes;
pub mod status;
pub mod synchronizers;
pub mod thread;

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::debug;

use crate::config::PoolConfig;

pub use counter::{CountedString, StringCounter};
pub use deadlocks::{DeadlockStatus, Severity};
pub use pools::{PoolGroup, UNPOOLED};
pub use status::{ThreadStatus, classify};
pub use synchronizers::{Synchronizer, compare_synchronizers, pretty_class_name};
pub use thread::{Thread, compare_threads};

use regexes::regex_frame_prefix;

/// Analysis of one thread dump snapshot. Threads are referenced everywhere
/// by their index in [`threads`](Self::threads).
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub id: usize,
    pub name: String,
    #[serde(skip)]
    pub pools: PoolConfig,
    pub date: Option<NaiveDateTime>,
    pub date_string: Option<String>,
    pub threads: Vec<Thread>,
    #[serde(skip)]
    pub thread_index: HashMap<String, usize>,
    pub threads_by_status: BTreeMap<ThreadStatus, Vec<usize>>,
    pub threads_by_pool: Vec<PoolGroup>,
    pub synchronizers: Vec<Synchronizer>,
    #[serde(skip)]
    pub synchronizer_index: HashMap<String, usize>,
    pub deadlock_status: DeadlockStatus,
    pub ignored_lines: StringCounter,
    pub running_methods: StringCounter,
}

impl Analysis {
    pub fn new(id: usize, name: impl Into<String>, pools: PoolConfig) -> Self {
        Self {
            id,
            name: name.into(),
            pools,
            ..Default::default()
        }
    }

    /// Analyze `text`, replacing any previous result held by `self`.
    pub fn analyze(&mut self, text: &str) {
        self.reset();

        let parsed = parser::parse_dump(text);
        self.date = parsed.date;
        self.date_string = parsed.date_string;
        self.ignored_lines = parsed.ignored;
        self.threads = parsed.threads;
        for (idx, thread) in self.threads.iter().enumerate() {
            self.thread_index.insert(thread.tid.clone(), idx);
        }

        self.map_threads_by_status();
        self.count_running_methods();

        let registry = synchronizers::build_registry(&self.threads);
        self.synchronizers = registry.synchronizers;
        self.synchronizer_index = registry.index;
        self.deadlock_status = deadlocks::analyze_deadlocks(
            &self.threads,
            &mut self.synchronizers,
            &self.synchronizer_index,
        );

        debug!(
            snapshot = self.id,
            threads = self.threads.len(),
            synchronizers = self.synchronizers.len(),
            severity = ?self.deadlock_status.severity,
            "analysis complete"
        );
    }

    fn reset(&mut self) {
        *self = Self {
            id: self.id,
            name: std::mem::take(&mut self.name),
            pools: std::mem::take(&mut self.pools),
            ..Default::default()
        };
    }

    /// Pools first, then statuses derived through them, so every thread is
    /// visited exactly once.
    fn map_threads_by_status(&mut self) {
        self.threads_by_pool = pools::group_by_pool(&self.threads, &self.pools);
        for group in &self.threads_by_pool {
            for &idx in &group.threads {
                let status = classify(&self.threads[idx]);
                self.threads_by_status.entry(status).or_default().push(idx);
            }
        }
    }

    fn count_running_methods(&mut self) {
        for (idx, thread) in self.threads.iter().enumerate() {
            if !classify(thread).is_running() {
                continue;
            }
            let Some(top) = thread.top_frame() else {
                continue;
            };
            let method = regex_frame_prefix().replace(top, "");
            self.running_methods.add_with_source(&method, idx);
        }
        let threads = &self.threads;
        self.running_methods
            .sort_sources_by(|a, b| compare_threads(&threads[*a], &threads[*b]));
    }

    pub fn thread_by_tid(&self, tid: &str) -> Option<&Thread> {
        self.thread_index.get(tid).map(|&idx| &self.threads[idx])
    }

    /// First thread with exactly this name.
    pub fn thread_by_name(&self, name: &str) -> Option<&Thread> {
        self.threads.iter().find(|thread| thread.name == name)
    }

    pub fn synchronizer(&self, id: &str) -> Option<&Synchronizer> {
        self.synchronizer_index
            .get(id)
            .map(|&idx| &self.synchronizers[idx])
    }

    pub fn status_of(&self, idx: usize) -> Option<ThreadStatus> {
        self.threads.get(idx).map(classify)
    }

    pub fn threads_with_status(&self, status: ThreadStatus) -> impl Iterator<Item = &Thread> {
        self.threads_by_status
            .get(&status)
            .into_iter()
            .flatten()
            .map(|&idx| &self.threads[idx])
    }

    pub fn pool(&self, name: &str) -> Option<&PoolGroup> {
        self.threads_by_pool.iter().find(|group| group.name == name)
    }

    /// Synchronizers ranked for display, most severe first.
    pub fn ranked_synchronizers(&self) -> Vec<&Synchronizer> {
        let mut ranked: Vec<&Synchronizer> = self.synchronizers.iter().collect();
        ranked.sort_by(|a, b| compare_synchronizers(a, b));
        ranked
    }
}

/// Analyze `text` in a fresh, unnamed [`Analysis`].
pub fn analyze_text(text: &str, pools: &PoolConfig) -> Analysis {
    let mut analysis = Analysis::new(0, "", pools.clone());
    analysis.analyze(text);
    analysis
}

#[cfg(test)]
mod tests {
    use super::*;

    const RUNNABLE_MAIN: &str = "\"main\" #1 prio=5 os_prio=0 tid=0x01 nid=0x02 runnable\n   java.lang.Thread.State: RUNNABLE\n\tat com.example.Foo.bar(Foo.java:10)";

    const CONTENDED: &str = "\
\"T1\" #10 prio=5 os_prio=0 tid=0x10 nid=0x100 waiting for monitor entry
   java.lang.Thread.State: BLOCKED (on object monitor)
\tat com.example.Store.put(Store.java:40)
\t- waiting to lock <0xAA> (a java.lang.Object)

\"T2\" #11 prio=5 os_prio=0 tid=0x11 nid=0x101 runnable
   java.lang.Thread.State: RUNNABLE
\tat com.example.Store.flush(Store.java:80)
\t- locked <0xAA> (a java.lang.Object)
";

    const DEADLOCK: &str = "\
2024-06-01 12:00:00
Full thread dump OpenJDK 64-Bit Server VM (17.0.2+8 mixed mode):

\"worker-A\" #20 prio=5 os_prio=0 tid=0x20 nid=0x200 waiting for monitor entry
   java.lang.Thread.State: BLOCKED (on object monitor)
\tat com.example.Bank.transfer(Bank.java:12)
\t- waiting to lock <0x00000000b2> (a com.example.Account)
\t- locked <0x00000000b1> (a com.example.Account)

\"worker-B\" #21 prio=5 os_prio=0 tid=0x21 nid=0x201 waiting for monitor entry
   java.lang.Thread.State: BLOCKED (on object monitor)
\tat com.example.Bank.transfer(Bank.java:12)
\t- waiting to lock <0x00000000b1> (a com.example.Account)
\t- locked <0x00000000b2> (a com.example.Account)
";

    #[test]
    fn single_runnable_thread() {
        let analysis = analyze_text(RUNNABLE_MAIN, &PoolConfig::default());
        assert_eq!(analysis.threads.len(), 1);
        let main = analysis.thread_by_tid("0x01").expect("main by tid");
        assert_eq!(main.name, "main");
        assert_eq!(main.thread_state.as_deref(), Some("RUNNABLE"));
        assert_eq!(main.frames, vec!["com.example.Foo.bar(Foo.java:10)"]);
        assert_eq!(analysis.status_of(0), Some(ThreadStatus::Running));
        assert!(analysis.synchronizers.is_empty());
        assert_eq!(analysis.deadlock_status.severity, Severity::NoRisk);
        assert_eq!(
            analysis.running_methods.count("com.example.Foo.bar(Foo.java:10)"),
            1
        );
    }

    #[test]
    fn contention_on_runnable_holder() {
        let analysis = analyze_text(CONTENDED, &PoolConfig::default());
        let lock = analysis.synchronizer("0xAA").expect("0xAA registered");
        assert_eq!(lock.lock_holder.map(|i| analysis.threads[i].name.as_str()), Some("T2"));
        let waiters: Vec<&str> = lock
            .lock_waiters
            .iter()
            .map(|&i| analysis.threads[i].name.as_str())
            .collect();
        assert_eq!(waiters, vec!["T1"]);
        assert_eq!(lock.deadlock_status.severity, Severity::NoRisk);
        assert_eq!(lock.class_name.as_deref(), Some("java.lang.Object"));
        assert_eq!(analysis.deadlock_status.severity, Severity::NoRisk);
    }

    #[test]
    fn classic_deadlock() {
        let analysis = analyze_text(DEADLOCK, &PoolConfig::from_names(["worker"]));
        assert_eq!(analysis.deadlock_status.severity, Severity::Deadlocked);
        assert_eq!(analysis.date_string.as_deref(), Some("2024-06-01 12:00:00"));
        assert_eq!(
            analysis
                .ignored_lines
                .count("Full thread dump OpenJDK 64-Bit Server VM (17.0.2+8 mixed mode):"),
            1
        );
        assert_eq!(analysis.pool("worker").map(PoolGroup::len), Some(2));
        assert_eq!(
            analysis
                .threads_with_status(ThreadStatus::WaitingToAcquire)
                .count(),
            2
        );
        assert!(analysis.running_methods.is_empty());
        let ranked = analysis.ranked_synchronizers();
        assert_eq!(ranked.len(), 2);
        assert!(ranked
            .iter()
            .all(|s| s.deadlock_status.severity == Severity::Deadlocked));
    }

    #[test]
    fn partitions_sum_to_thread_count() {
        let text = format!("{DEADLOCK}\n{CONTENDED}\n{RUNNABLE_MAIN}");
        let analysis = analyze_text(&text, &PoolConfig::from_names(["worker", "T"]));
        let by_pool: usize = analysis.threads_by_pool.iter().map(PoolGroup::len).sum();
        let by_status: usize = analysis.threads_by_status.values().map(Vec::len).sum();
        assert_eq!(analysis.threads.len(), 5);
        assert_eq!(by_pool, 5);
        assert_eq!(by_status, 5);
        assert!(analysis.threads.iter().all(|t| !t.name.is_empty() && !t.tid.is_empty()));
    }

    #[test]
    fn reanalyze_resets_state() {
        let mut analysis = Analysis::new(7, "Thread Dump Analysis 7", PoolConfig::default());
        analysis.analyze(DEADLOCK);
        assert_eq!(analysis.deadlock_status.severity, Severity::Deadlocked);

        analysis.analyze(RUNNABLE_MAIN);
        assert_eq!(analysis.id, 7);
        assert_eq!(analysis.name, "Thread Dump Analysis 7");
        assert_eq!(analysis.threads.len(), 1);
        assert!(analysis.synchronizers.is_empty());
        assert!(analysis.date_string.is_none());
        assert!(analysis.ignored_lines.is_empty());
        assert_eq!(analysis.deadlock_status.severity, Severity::NoRisk);
    }

    #[test]
    fn deterministic() {
        let config = PoolConfig::from_names(["worker"]);
        let a = serde_json::to_string(&analyze_text(DEADLOCK, &config)).expect("serialize");
        let b = serde_json::to_string(&analyze_text(DEADLOCK, &config)).expect("serialize");
        assert_eq!(a, b);
    }

    #[test]
    fn whitespace_only_input() {
        let analysis = analyze_text("  \n\n\t\n", &PoolConfig::default());
        assert!(analysis.threads.is_empty());
        assert!(analysis.ignored_lines.is_empty());
        assert_eq!(analysis.deadlock_status, DeadlockStatus::no_risk());
        assert_eq!(analysis.threads_by_pool.len(), 1);
        assert!(analysis.threads_by_status.is_empty());
    }

    #[test]
    fn garbage_does_not_panic() {
        let analysis = analyze_text(
            "garbage input xyz\n\"\n\"unterminated",
            &PoolConfig::default(),
        );
        assert_eq!(analysis.ignored_lines.count("garbage input xyz"), 1);
    }
}
