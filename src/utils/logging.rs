use serde::Serialize;

/// Knowledge bases can be large; debug dumps are cut after this many chars.
const MAX_DEBUG_JSON_CHARS: usize = 4_000;

/// Run `log_action` with a pretty JSON rendering of `value`, only when DEBUG is enabled.
pub(crate) fn with_pretty_json_debug<T, F>(value: &T, log_action: F)
where
    T: Serialize,
    F: FnOnce(&str),
{
    if !tracing::enabled!(tracing::Level::DEBUG) {
        return;
    }

    let pretty_json = serde_json::to_string_pretty(value)
        .unwrap_or_else(|error| format!("<pretty serialize failed: {error}>"));
    log_action(truncate_chars(&pretty_json, MAX_DEBUG_JSON_CHARS));
}

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
