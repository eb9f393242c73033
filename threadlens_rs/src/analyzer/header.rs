//! Thread header lines.
//!
//! A header starts with `"` and normally carries `prio=` on the same line:
//!
//! ```text
//! "http-nio-8080-exec-1" #31 daemon prio=5 os_prio=0 tid=0x00007f4c2c0a1000 nid=0x2b0f waiting on condition [0x00007f4bf3ffe000]
//! ```
//!
//! Thread names may contain literal newlines, which splits the header over
//! several physical lines. [`assemble_header`] re-joins them with `", "`
//! before [`parse_header`] cuts the known fields out one by one.

use std::borrow::Cow;

use regex::Regex;

use super::regexes::{
    regex_header_bare_name, regex_header_daemon, regex_header_group, regex_header_last_sp,
    regex_header_lightweight_tid, regex_header_name, regex_header_nid, regex_header_number,
    regex_header_os_prio, regex_header_prio, regex_header_tid,
};

/// Progress of header re-assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum HeaderState {
    AwaitingHeaderStart,
    AccumulatingHeader(String),
    HeaderComplete(String),
}

/// True for a line that opens a thread header but has no terminal marker yet.
pub(crate) fn is_incomplete_header(line: &str) -> bool {
    if !line.starts_with('"') {
        return false;
    }
    !(line.contains("prio=") || line.contains("Thread t@") || line.ends_with("\":"))
}

/// Join continuation lines onto `first` until the header is complete or
/// `rest` runs dry. Lines that are not incomplete headers come back unchanged.
pub(crate) fn assemble_header<'a, I>(first: &'a str, rest: &mut I) -> Cow<'a, str>
where
    I: Iterator<Item = &'a str>,
{
    let mut state = HeaderState::AwaitingHeaderStart;
    loop {
        state = match state {
            HeaderState::AwaitingHeaderStart => {
                if !is_incomplete_header(first) {
                    return Cow::Borrowed(first);
                }
                HeaderState::AccumulatingHeader(first.to_string())
            }
            HeaderState::AccumulatingHeader(mut header) => match rest.next() {
                Some(next) => {
                    header.push_str(", ");
                    header.push_str(next);
                    if is_incomplete_header(&header) {
                        HeaderState::AccumulatingHeader(header)
                    } else {
                        HeaderState::HeaderComplete(header)
                    }
                }
                None => HeaderState::HeaderComplete(header),
            },
            HeaderState::HeaderComplete(header) => return Cow::Owned(header),
        };
    }
}

/// Fields cut out of a header line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct HeaderFields {
    pub name: Option<String>,
    pub tid: Option<String>,
    pub nid: Option<String>,
    pub prio: Option<String>,
    pub os_prio: Option<String>,
    pub daemon: bool,
    pub number: Option<String>,
    pub group: Option<String>,
    pub last_sp: Option<String>,
    pub state: String,
}

/// Remove the first match of `re` from `line` and return its first group.
fn extract(re: &Regex, line: &mut String) -> Option<String> {
    let (range, value) = {
        let caps = re.captures(line)?;
        let whole = caps.get(0)?;
        let value = caps.get(1)?.as_str().to_string();
        (whole.range(), value)
    };
    line.replace_range(range, "");
    Some(value)
}

/// Parse a header line. The passes are order dependent: each one sees the
/// line with the previous matches removed.
pub(crate) fn parse_header(line: &str) -> HeaderFields {
    let mut rest = line.to_string();

    let last_sp = extract(regex_header_last_sp(), &mut rest);
    let nid = extract(regex_header_nid(), &mut rest);
    let tid = extract(regex_header_tid(), &mut rest)
        .or_else(|| extract(regex_header_lightweight_tid(), &mut rest));
    let prio = extract(regex_header_prio(), &mut rest);
    let os_prio = extract(regex_header_os_prio(), &mut rest);
    let daemon = extract(regex_header_daemon(), &mut rest).is_some();
    let number = extract(regex_header_number(), &mut rest);
    let group = extract(regex_header_group(), &mut rest);
    let name = extract(regex_header_name(), &mut rest)
        .or_else(|| extract(regex_header_bare_name(), &mut rest));

    HeaderFields {
        name,
        tid,
        nid,
        prio,
        os_prio,
        daemon,
        number,
        group,
        last_sp,
        state: rest.trim().to_string(),
    }
}
