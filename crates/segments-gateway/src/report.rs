//! CSV rendering of membership history.

use std::fmt::Write as _;

use segments_control::HistoryEntry;

/// Header row of the history report.
pub const HEADER: &str = "user_id,segment_name,action_type,action_date";

/// Layout of `action_date` in the report.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Render history entries as CSV, header first, one line per entry.
#[must_use]
pub fn history_csv(entries: &[HistoryEntry]) -> String {
    let mut out = String::with_capacity(HEADER.len() + 1 + entries.len() * 48);
    out.push_str(HEADER);
    out.push('\n');

    for entry in entries {
        // Writing into a String cannot fail.
        let _ = writeln!(
            out,
            "{},{},{},{}",
            entry.user_id,
            escape(entry.segment_name.as_str()),
            entry.action_type,
            entry.action_date.format(DATE_FORMAT)
        );
    }

    out
}

/// Quote a field if it contains a delimiter, quote or line break.
fn escape(field: &str) -> std::borrow::Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\"")).into()
    } else {
        field.into()
    }
}
