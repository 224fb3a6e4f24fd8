// ABOUTME: POSIX shell quoting for commands sent over the remote channel.
// ABOUTME: Every path and name interpolated into a remote command goes through here.

/// Quote a string as a single POSIX shell word.
///
/// Strings made only of characters the shell never interprets are returned
/// unchanged so that logged commands stay readable.
pub fn quote(value: &str) -> String {
    let is_plain = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/' | ':' | '@' | '=' | '+' | ','));

    if is_plain {
        value.to_string()
    } else {
        format!("'{}'", value.replace('\'', "'\\''"))
    }
}
