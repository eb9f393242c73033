//! Line-oriented thread dump parser.
//!
//! Every physical line is classified in turn: snapshot timestamp, thread
//! header (re-joined when the name spans lines), blank, or a stack line that
//! belongs to the most recent thread. Anything else lands in the ignored-line
//! tally; the parser never fails.

use chrono::NaiveDateTime;
use tracing::debug;

use super::counter::StringCounter;
use super::header::{assemble_header, parse_header};
use super::regexes::{
    regex_blank, regex_frame, regex_held_lock, regex_locked_ownable_synchronizers,
    regex_none_held, regex_snapshot_date, regex_synchronization_status, regex_thread_state,
};
use super::thread::Thread;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// `java.lang.Thread.State` values of threads inside `Object.wait()`.
const OBJECT_MONITOR_WAITS: [&str; 2] = [
    "TIMED_WAITING (on object monitor)",
    "WAITING (on object monitor)",
];

/// Everything the parser extracts from one snapshot.
#[derive(Debug, Default)]
pub(crate) struct ParsedDump {
    pub threads: Vec<Thread>,
    pub ignored: StringCounter,
    pub date: Option<NaiveDateTime>,
    pub date_string: Option<String>,
}

#[derive(Default)]
struct DumpParser {
    out: ParsedDump,
    current: Option<usize>,
    generated_ids: usize,
}

/// Parse a whole snapshot into thread records.
pub(crate) fn parse_dump(text: &str) -> ParsedDump {
    let mut parser = DumpParser::default();
    let mut lines = text.lines();

    while let Some(line) = lines.next() {
        if parser.out.date_string.is_none() && parser.take_date(line) {
            continue;
        }
        let line = assemble_header(line, &mut lines);
        parser.handle_line(&line);
    }

    let mut out = parser.out;
    identify_waited_for_synchronizers(&mut out.threads);
    debug!(
        threads = out.threads.len(),
        ignored = out.ignored.len(),
        "parsed thread dump"
    );
    out
}

impl DumpParser {
    fn take_date(&mut self, line: &str) -> bool {
        let trimmed = line.trim();
        if !regex_snapshot_date().is_match(trimmed) {
            return false;
        }
        self.out.date = NaiveDateTime::parse_from_str(trimmed, DATE_FORMAT).ok();
        self.out.date_string = Some(trimmed.to_string());
        true
    }

    fn handle_line(&mut self, line: &str) {
        if line.starts_with('"') && self.start_thread(line) {
            return;
        }
        if regex_blank().is_match(line) {
            return;
        }
        let consumed = match self.current {
            Some(idx) => add_stack_line(&mut self.out.threads[idx], line),
            None => false,
        };
        if !consumed {
            self.out.ignored.add(line);
        }
    }

    /// Returns false when the header has no extractable name.
    fn start_thread(&mut self, line: &str) -> bool {
        let fields = parse_header(line);
        let Some(name) = fields.name else {
            debug!(line, "dropping thread header without a name");
            return false;
        };
        let tid = fields.tid.unwrap_or_else(|| {
            let id = format!("generated-id-{}", self.generated_ids);
            self.generated_ids += 1;
            id
        });

        self.out.threads.push(Thread {
            name,
            tid,
            nid: fields.nid,
            prio: fields.prio,
            os_prio: fields.os_prio,
            daemon: fields.daemon,
            number: fields.number,
            group: fields.group,
            last_sp: fields.last_sp,
            state: fields.state,
            ..Default::default()
        });
        self.current = Some(self.out.threads.len() - 1);
        true
    }
}

/// Apply one stack line to `thread`. Returns false if the line is not
/// recognised.
pub(crate) fn add_stack_line(thread: &mut Thread, line: &str) -> bool {
    if let Some(caps) = regex_frame().captures(line) {
        thread.frames.push(caps[1].to_string());
        return true;
    }

    if let Some(caps) = regex_thread_state().captures(line) {
        thread.thread_state = Some(caps[1].to_string());
        return true;
    }

    if let Some(caps) = regex_synchronization_status().captures(line) {
        let verb = &caps[1];
        let id = &caps[2];
        thread
            .synchronizer_classes
            .insert(id.to_string(), caps[3].to_string());

        return match verb {
            // Lock elision by the JIT; nothing is actually held.
            "eliminated" => true,
            "waiting on" | "parking to wait for" => {
                thread.want_notification_on = Some(id.to_string());
                true
            }
            "waiting to lock" => {
                thread.want_to_acquire = Some(id.to_string());
                true
            }
            "locked" => {
                record_locked(thread, id);
                true
            }
            _ => false,
        };
    }

    if let Some(caps) = regex_held_lock().captures(line) {
        let id = &caps[1];
        thread
            .synchronizer_classes
            .insert(id.to_string(), caps[2].to_string());
        thread.add_lock_held(id);
        return true;
    }

    regex_locked_ownable_synchronizers().is_match(line) || regex_none_held().is_match(line)
}

fn record_locked(thread: &mut Thread, id: &str) {
    // Released again while parked in wait()
    if thread.want_notification_on.as_deref() == Some(id) {
        return;
    }
    thread.add_lock_held(id);

    let n = thread.frames.len();
    if n >= 2
        && thread.classical_lock_held.is_none()
        && thread.frames[n - 2].contains("java.lang.Object.wait")
    {
        thread.classical_lock_held = Some(id.to_string());
    }
}

/// Some dump formats omit `- waiting on` for the legacy `wait()` idiom. A
/// thread in an object-monitor wait that holds a classical lock is really
/// waiting for notification on it.
pub(crate) fn identify_waited_for_synchronizers(threads: &mut [Thread]) {
    for thread in threads.iter_mut() {
        let waiting_on_monitor = thread
            .thread_state
            .as_deref()
            .is_some_and(|state| OBJECT_MONITOR_WAITS.contains(&state));
        if !waiting_on_monitor || thread.want_notification_on.is_some() {
            continue;
        }
        if let Some(lock) = thread.classical_lock_held.clone() {
            thread.set_want_notification_on(&lock);
        }
    }
}
