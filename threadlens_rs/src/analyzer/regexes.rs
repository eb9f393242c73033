use std::sync::OnceLock;

use regex::Regex;

fn regex(pattern: &str) -> Regex {
    Regex::new(pattern).expect("valid regex literal")
}

// ----------------------------------------------------------------------------
// Snapshot-level lines
// ----------------------------------------------------------------------------

pub(crate) fn regex_snapshot_date() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| regex(r#"^([0-9]{4})-([0-9]{2})-([0-9]{2}) ([0-9]{2}):([0-9]{2}):([0-9]{2})$"#))
}

pub(crate) fn regex_blank() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| regex(r#"^\s*$"#))
}

// ----------------------------------------------------------------------------
// Thread header fields, applied in this order by `header::parse_header`
// ----------------------------------------------------------------------------

pub(crate) fn regex_header_last_sp() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| regex(r#"\[([0-9a-fA-FxX,]+)\]$"#))
}

pub(crate) fn regex_header_nid() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| regex(r#" nid=([0-9a-fA-FxX,]+)"#))
}

pub(crate) fn regex_header_tid() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| regex(r#" tid=([0-9a-fA-FxX,]+)"#))
}

pub(crate) fn regex_header_lightweight_tid() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Some VMs print `"name" - Thread t@42` instead of `tid=`
    RE.get_or_init(|| regex(r#" - Thread t@([0-9a-fA-FxX]+)"#))
}

pub(crate) fn regex_header_prio() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| regex(r#" prio=([0-9]+)"#))
}

pub(crate) fn regex_header_os_prio() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| regex(r#" os_prio=([0-9a-fA-FxX,]+)"#))
}

pub(crate) fn regex_header_daemon() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| regex(r#" (daemon)"#))
}

pub(crate) fn regex_header_number() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| regex(r#" #([0-9]+)"#))
}

pub(crate) fn regex_header_group() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| regex(r#" group="(.*)""#))
}

pub(crate) fn regex_header_name() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| regex(r#"^"(.*)" "#))
}

pub(crate) fn regex_header_bare_name() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| regex(r#"^"(.*)":?$"#))
}

// ----------------------------------------------------------------------------
// Stack lines
// ----------------------------------------------------------------------------

pub(crate) fn regex_frame() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| regex(r#"^\s*at (.*)"#))
}

pub(crate) fn regex_thread_state() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| regex(r#"^\s*java\.lang\.Thread\.State: (.*)"#))
}

pub(crate) fn regex_synchronization_status() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // - waiting to lock <0x000000076ab62208> (a java.lang.Object)
    RE.get_or_init(|| regex(r#"^\s*- (.*?) +<([0-9a-fA-FxX]+)> \(a (.*)\)"#))
}

pub(crate) fn regex_held_lock() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Entry under "Locked ownable synchronizers:"
    RE.get_or_init(|| regex(r#"^\s*- <([0-9a-fA-FxX]+)> \(a (.*)\)"#))
}

pub(crate) fn regex_locked_ownable_synchronizers() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| regex(r#"^\s*Locked ownable synchronizers:"#))
}

pub(crate) fn regex_none_held() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| regex(r#"^\s*- None"#))
}

pub(crate) fn regex_frame_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| regex(r#"^\s+at\s+"#))
}

// ----------------------------------------------------------------------------
// Class names
// ----------------------------------------------------------------------------

pub(crate) fn regex_class_literal() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| regex(r#"^java\.lang\.Class for .*\.([^.]*)$"#))
}

pub(crate) fn regex_class_simple_name() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| regex(r#"^.*\.([^.]*)$"#))
}

// ----------------------------------------------------------------------------
// Snapshot files
// ----------------------------------------------------------------------------

pub(crate) fn regex_dump_file_name() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| regex(r#"^threaddump-([0-9]+)-[0-9]+\.txt$"#))
}
