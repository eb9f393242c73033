//! Renderings of an [`Analysis`]: a compact serializable summary, the
//! indented plain-text form used for downstream tooling, and the coloured
//! terminal report.

use std::fmt::Write as _;

use console::style;
use serde::Serialize;

use crate::analyzer::{Analysis, Severity, ThreadStatus, pretty_class_name};

/// Number of hotspot and synchronizer rows shown in the terminal report.
const TOP_ROWS: usize = 10;

/// Compact view of one snapshot.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummary {
    pub deadlocks: DeadlockSummary,
    pub threads_by_state: Vec<StateGroup>,
    pub threads_by_pool: Vec<PoolSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeadlockSummary {
    pub severity: Severity,
    pub label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StateGroup {
    pub status: ThreadStatus,
    pub threads: Vec<ThreadSummary>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadSummary {
    pub name: String,
    pub thread_state: Option<String>,
    pub want_notification_on: Option<String>,
    pub classical_lock_held: Option<String>,
    pub tid: String,
    pub locks_held: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PoolSummary {
    pub pool: String,
    pub threads: Vec<String>,
}

impl AnalysisSummary {
    pub fn from_analysis(analysis: &Analysis) -> Self {
        let threads_by_state = ThreadStatus::ALL
            .iter()
            .filter_map(|status| {
                let members = analysis.threads_by_status.get(status)?;
                Some(StateGroup {
                    status: *status,
                    threads: members
                        .iter()
                        .map(|&idx| {
                            let thread = &analysis.threads[idx];
                            ThreadSummary {
                                name: thread.name.clone(),
                                thread_state: thread.thread_state.clone(),
                                want_notification_on: thread.want_notification_on.clone(),
                                classical_lock_held: thread.classical_lock_held.clone(),
                                tid: thread.tid.clone(),
                                locks_held: thread.locks_held.clone(),
                            }
                        })
                        .collect(),
                })
            })
            .collect();

        let threads_by_pool = analysis
            .threads_by_pool
            .iter()
            .map(|group| PoolSummary {
                pool: group.name.clone(),
                threads: group
                    .threads
                    .iter()
                    .map(|&idx| analysis.threads[idx].name.clone())
                    .collect(),
            })
            .collect();

        Self {
            deadlocks: DeadlockSummary {
                severity: analysis.deadlock_status.severity,
                label: analysis.deadlock_status.severity.label(),
                detail: analysis.deadlock_status.detail.clone(),
            },
            threads_by_state,
            threads_by_pool,
        }
    }
}

fn opt(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("None")
}

/// Indented text form:
///
/// ```text
/// deadlocks:
///   Deadlocked
/// threadsByState:
///   waiting to acquire:
///     {name: worker-A, threadState: BLOCKED (on object monitor), ...}
/// threadsByPool:
///   worker:
///     worker-A
/// ```
pub fn render_summary_text(summary: &AnalysisSummary) -> String {
    let mut out = String::new();

    out.push_str("deadlocks:\n");
    match &summary.deadlocks.detail {
        Some(detail) => {
            let _ = writeln!(out, "  {} - {}", summary.deadlocks.label, detail);
        }
        None => {
            let _ = writeln!(out, "  {}", summary.deadlocks.label);
        }
    }

    out.push_str("threadsByState:");
    for group in &summary.threads_by_state {
        let _ = write!(out, "\n  {}:", group.status);
        for t in &group.threads {
            let _ = write!(
                out,
                "\n    {{name: {}, threadState: {}, wantNotificationOn: {}, classicalLockHeld: {}, tid: {}, locksHeld: [{}]}}",
                t.name,
                opt(&t.thread_state),
                opt(&t.want_notification_on),
                opt(&t.classical_lock_held),
                t.tid,
                t.locks_held.join(", ")
            );
        }
    }

    out.push_str("\nthreadsByPool:");
    for pool in &summary.threads_by_pool {
        let _ = write!(out, "\n  {}:", pool.pool);
        for name in &pool.threads {
            let _ = write!(out, "\n    {name}");
        }
    }

    out
}

/// Join several snapshot renderings with a blank line between them.
pub fn combine_summaries<'a, I>(summaries: I) -> String
where
    I: IntoIterator<Item = &'a AnalysisSummary>,
{
    summaries
        .into_iter()
        .map(render_summary_text)
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn styled_severity(severity: Severity) -> String {
    let label = severity.label();
    match severity.notification_level() {
        "danger" => style(label).red().bold().to_string(),
        "warning" => style(label).yellow().bold().to_string(),
        "info" => style(label).cyan().to_string(),
        _ => style(label).green().to_string(),
    }
}

/// Terminal report for one snapshot.
pub fn render_human(analysis: &Analysis) -> String {
    let mut out = String::new();

    let title = if analysis.name.is_empty() {
        "Thread dump analysis".to_string()
    } else {
        analysis.name.clone()
    };
    let _ = writeln!(out, "{}", style(title).bold());
    if let Some(date) = &analysis.date_string {
        let _ = writeln!(out, "  taken at {date}");
    }

    let status = &analysis.deadlock_status;
    let _ = write!(out, "  {}", styled_severity(status.severity));
    if let Some(detail) = &status.detail {
        let _ = write!(out, " - {detail}");
    }
    let _ = writeln!(
        out,
        " ({} threads, {} synchronizers)",
        analysis.threads.len(),
        analysis.synchronizers.len()
    );

    let _ = writeln!(out, "\n{}", style("Threads by state").underlined());
    for status in ThreadStatus::ALL {
        if let Some(members) = analysis.threads_by_status.get(&status) {
            let _ = writeln!(out, "  {:>5}  {}", members.len(), status);
        }
    }

    let _ = writeln!(out, "\n{}", style("Threads by pool").underlined());
    for group in &analysis.threads_by_pool {
        let _ = writeln!(out, "  {:>5}  {}", group.len(), group.name);
    }

    if !analysis.running_methods.is_empty() {
        let _ = writeln!(out, "\n{}", style("Running methods").underlined());
        for row in analysis.running_methods.entries().into_iter().take(TOP_ROWS) {
            let _ = writeln!(out, "  {:>5}  {}", row.count, row.string);
        }
    }

    let risky: Vec<_> = analysis
        .ranked_synchronizers()
        .into_iter()
        .filter(|sync| sync.thread_count() > 1 || !sync.deadlock_status.is_no_risk())
        .take(TOP_ROWS)
        .collect();
    if !risky.is_empty() {
        let _ = writeln!(out, "\n{}", style("Synchronizers").underlined());
        for sync in risky {
            let class = sync
                .class_name
                .as_deref()
                .map(pretty_class_name)
                .unwrap_or_else(|| "?".to_string());
            let holder = sync
                .lock_holder
                .map(|idx| analysis.threads[idx].name.as_str())
                .unwrap_or("-");
            let _ = writeln!(
                out,
                "  <{}> {}  {}  holder: {}, waiting to lock: {}, awaiting notification: {}",
                sync.id,
                class,
                styled_severity(sync.deadlock_status.severity),
                holder,
                sync.lock_waiters.len(),
                sync.notification_waiters.len()
            );
        }
    }

    if !analysis.ignored_lines.is_empty() {
        let _ = writeln!(
            out,
            "\n{} unrecognized line(s) ignored",
            analysis.ignored_lines.len()
        );
    }

    out
}
