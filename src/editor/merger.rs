//! Line-level merge of an update set into `key=value` text.
//!
//! # Rules
//! - Blank and whitespace-only lines are dropped.
//! - A line is managed by key `K` when it starts with `"K="`. Every managed
//!   line of a key in the update set is dropped, duplicates included.
//! - Each `Set` entry is appended as one `key=value` line, in update order.
//! - Unmanaged lines keep their relative order.
//! - Output lines are joined with `\n`, without a trailing newline.

use crate::editor::update_set::{UpdateSet, UpdateValue};

/// Compute the next file contents from `current` and `updates`.
pub fn merge(current: &str, updates: &UpdateSet) -> String {
    let prefixes: Vec<String> = updates.keys().map(|k| format!("{}=", k)).collect();

    let mut lines: Vec<&str> = current
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.trim().is_empty())
        .filter(|line| !prefixes.iter().any(|p| line.starts_with(p.as_str())))
        .collect();

    let appended: Vec<String> = updates
        .iter()
        .filter_map(|(key, value)| match value {
            UpdateValue::Set(v) => Some(format!("{}={}", key, v)),
            UpdateValue::Delete => None,
        })
        .collect();
    lines.extend(appended.iter().map(String::as_str));

    lines.join("\n")
}

/// Parse `key=value` lines into an update set that reproduces them.
///
/// Opaque lines are skipped, as are `#`/`;` comments. Used to re-derive
/// updates from a written file.
pub fn parse_entries(text: &str) -> UpdateSet {
    text.lines()
        .filter(|line| !line.starts_with(['#', ';']))
        .filter_map(|line| line.split_once('='))
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (key, UpdateValue::from_input(Some(value))))
        .collect()
}
