//! POSIX shell quoting for values interpolated into directive text.

/// Quote a value for safe interpolation into a POSIX shell command.
///
/// Values made only of characters that are never special to the shell are
/// returned unchanged so rendered scripts stay readable. Everything else is
/// wrapped in single quotes, with embedded single quotes encoded as `'\''`.
pub fn quote(value: &str) -> String {
    if !value.is_empty() && value.chars().all(is_safe) {
        return value.to_string();
    }

    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for c in value.chars() {
        if c == '\'' {
            quoted.push_str("'\\''");
        } else {
            quoted.push(c);
        }
    }
    quoted.push('\'');
    quoted
}

fn is_safe(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(c, '_' | '-' | '.' | '/' | ':' | '=' | '@' | ',' | '+' | '%' | '^')
}
