//! Thread status classification.
//!
//! [`classify`] is a pure function of the parsed fields; nothing is cached on
//! the thread, so the status always reflects the current lock annotations.

use std::fmt;

use serde::Serialize;

use super::thread::Thread;

/// Semantic status of a thread, derived from its parsed fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ThreadStatus {
    #[serde(rename = "running")]
    Running,
    #[serde(rename = "awaiting notification")]
    AwaitingNotification,
    #[serde(rename = "awaiting notification (timed)")]
    AwaitingNotificationTimed,
    #[serde(rename = "waiting to acquire")]
    WaitingToAcquire,
    #[serde(rename = "sleeping")]
    Sleeping,
    #[serde(rename = "not started")]
    NotStarted,
    #[serde(rename = "terminated")]
    Terminated,
    #[serde(rename = "non-Java thread")]
    NonJavaThread,
    #[serde(rename = "?unknown?")]
    Unknown,
}

impl ThreadStatus {
    /// Every status, in report order.
    pub const ALL: [ThreadStatus; 9] = [
        ThreadStatus::Running,
        ThreadStatus::AwaitingNotification,
        ThreadStatus::AwaitingNotificationTimed,
        ThreadStatus::WaitingToAcquire,
        ThreadStatus::Sleeping,
        ThreadStatus::NotStarted,
        ThreadStatus::Terminated,
        ThreadStatus::NonJavaThread,
        ThreadStatus::Unknown,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ThreadStatus::Running => "running",
            ThreadStatus::AwaitingNotification => "awaiting notification",
            ThreadStatus::AwaitingNotificationTimed => "awaiting notification (timed)",
            ThreadStatus::WaitingToAcquire => "waiting to acquire",
            ThreadStatus::Sleeping => "sleeping",
            ThreadStatus::NotStarted => "not started",
            ThreadStatus::Terminated => "terminated",
            ThreadStatus::NonJavaThread => "non-Java thread",
            ThreadStatus::Unknown => "?unknown?",
        }
    }

    pub fn is_running(&self) -> bool {
        *self == ThreadStatus::Running
    }

    pub fn is_waiting(&self) -> bool {
        matches!(
            self,
            ThreadStatus::WaitingToAcquire
                | ThreadStatus::AwaitingNotification
                | ThreadStatus::AwaitingNotificationTimed
        )
    }
}

impl fmt::Display for ThreadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify a thread. First matching rule wins; the order matters.
pub fn classify(thread: &Thread) -> ThreadStatus {
    if thread.want_notification_on.is_some() {
        return ThreadStatus::AwaitingNotification;
    }
    let state = thread.thread_state.as_deref();
    match state {
        Some("WAITING (on object monitor)") => return ThreadStatus::AwaitingNotification,
        Some("TIMED_WAITING (on object monitor)") => {
            return ThreadStatus::AwaitingNotificationTimed;
        }
        _ => {}
    }
    if thread.want_to_acquire.is_some() {
        return ThreadStatus::WaitingToAcquire;
    }
    match state {
        Some("TIMED_WAITING (sleeping)") => return ThreadStatus::Sleeping,
        Some("NEW") => return ThreadStatus::NotStarted,
        Some("TERMINATED") => return ThreadStatus::Terminated,
        Some("WAITING (parking)") => return ThreadStatus::AwaitingNotification,
        Some("TIMED_WAITING (parking)") => return ThreadStatus::AwaitingNotificationTimed,
        Some("BLOCKED (on object monitor)") => return ThreadStatus::WaitingToAcquire,
        _ => {}
    }
    if thread.frames.is_empty() {
        return ThreadStatus::NonJavaThread;
    }
    match state {
        Some("RUNNABLE") => ThreadStatus::Running,
        None => classify_header_state(&thread.state),
        Some(_) => ThreadStatus::Unknown,
    }
}

/// Fallback for dumps without a `java.lang.Thread.State:` line.
fn classify_header_state(state: &str) -> ThreadStatus {
    match state {
        "RUNNABLE" => ThreadStatus::Running,
        "TIMED_WAITING" => ThreadStatus::AwaitingNotificationTimed,
        "WAITING" => ThreadStatus::AwaitingNotification,
        "NEW" => ThreadStatus::NotStarted,
        "TERMINATED" => ThreadStatus::Terminated,
        "BLOCKED" => ThreadStatus::WaitingToAcquire,
        _ => ThreadStatus::NonJavaThread,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thread_in(state: Option<&str>, frames: usize) -> Thread {
        let mut thread = Thread::new("t", "0x1");
        thread.thread_state = state.map(str::to_string);
        thread.frames = (0..frames).map(|i| format!("Frame.f{i}")).collect();
        thread
    }

    #[test]
    fn want_notification_wins_over_everything() {
        let mut thread = thread_in(Some("RUNNABLE"), 1);
        thread.want_notification_on = Some("0xa".into());
        thread.want_to_acquire = Some("0xb".into());
        assert_eq!(classify(&thread), ThreadStatus::AwaitingNotification);
    }

    #[test]
    fn object_monitor_waits_beat_acquire() {
        let mut thread = thread_in(Some("TIMED_WAITING (on object monitor)"), 1);
        thread.want_to_acquire = Some("0xb".into());
        assert_eq!(classify(&thread), ThreadStatus::AwaitingNotificationTimed);
    }

    #[test]
    fn explicit_states_map() {
        let cases = [
            ("WAITING (on object monitor)", ThreadStatus::AwaitingNotification),
            ("TIMED_WAITING (sleeping)", ThreadStatus::Sleeping),
            ("NEW", ThreadStatus::NotStarted),
            ("TERMINATED", ThreadStatus::Terminated),
            ("WAITING (parking)", ThreadStatus::AwaitingNotification),
            ("TIMED_WAITING (parking)", ThreadStatus::AwaitingNotificationTimed),
            ("BLOCKED (on object monitor)", ThreadStatus::WaitingToAcquire),
            ("RUNNABLE", ThreadStatus::Running),
            ("SOMETHING ELSE", ThreadStatus::Unknown),
        ];
        for (state, expected) in cases {
            assert_eq!(classify(&thread_in(Some(state), 2)), expected, "{state}");
        }
    }

    #[test]
    fn frameless_runnable_is_not_java() {
        assert_eq!(
            classify(&thread_in(Some("RUNNABLE"), 0)),
            ThreadStatus::NonJavaThread
        );
    }

    #[test]
    fn frameless_blocked_is_still_blocked() {
        assert_eq!(
            classify(&thread_in(Some("BLOCKED (on object monitor)"), 0)),
            ThreadStatus::WaitingToAcquire
        );
    }

    #[test]
    fn falls_back_to_header_state() {
        let mut thread = thread_in(None, 1);
        thread.state = "TIMED_WAITING".into();
        assert_eq!(classify(&thread), ThreadStatus::AwaitingNotificationTimed);
        thread.state = "runnable".into();
        assert_eq!(classify(&thread), ThreadStatus::NonJavaThread);
        thread.state = "BLOCKED".into();
        assert_eq!(classify(&thread), ThreadStatus::WaitingToAcquire);
    }

    #[test]
    fn waiting_and_running_predicates() {
        assert!(ThreadStatus::Running.is_running());
        assert!(!ThreadStatus::Sleeping.is_waiting());
        for status in [
            ThreadStatus::WaitingToAcquire,
            ThreadStatus::AwaitingNotification,
            ThreadStatus::AwaitingNotificationTimed,
        ] {
            assert!(status.is_waiting());
        }
        assert_eq!(ThreadStatus::ALL.len(), 9);
        assert_eq!(ThreadStatus::NonJavaThread.to_string(), "non-Java thread");
    }
}
