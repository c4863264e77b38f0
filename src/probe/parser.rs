//! Parsing of OpenSSH client debug output.
//!
//! `ssh -v` prints a line such as
//!
//! ```text
//! debug1: Authentications that can continue: publickey,gssapi-keyex,gssapi-with-mic,password
//! ```
//!
//! when the server rejects an authentication attempt. The text is lower-cased
//! once with [`normalize`]; all other functions here expect normalized input.

/// Prefix of the line listing the methods a server offers (normalized).
pub const AUTH_LINE_PREFIX: &str = "debug1: authentications that can continue:";

/// Marker proving the output came from an OpenSSH client talking to OpenSSH.
pub const OPENSSH_MARKER: &str = "openssh";

/// Decode raw client output and lower-case it.
pub fn normalize(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).to_lowercase()
}

/// First line starting with [`AUTH_LINE_PREFIX`], or `None`.
///
/// A missing line is not an error: it means nothing was offered (for example
/// the login succeeded through `none`). Later lines are never considered, even
/// if the client retried and printed a different list.
pub fn extract_auth_line(text: &str) -> Option<&str> {
    text.lines().find(|line| line.starts_with(AUTH_LINE_PREFIX))
}

/// Whether the text contains an auth line anywhere.
pub fn has_auth_line(text: &str) -> bool {
    text.contains(AUTH_LINE_PREFIX)
}

/// Whether the output identifies an OpenSSH implementation.
pub fn is_openssh(text: &str) -> bool {
    text.contains(OPENSSH_MARKER)
}

/// Method names listed on an auth line, in server order.
///
/// Only used for logging; policy matching works on the whole line.
pub fn offered_names(auth_line: &str) -> Vec<&str> {
    auth_line
        .strip_prefix(AUTH_LINE_PREFIX)
        .unwrap_or(auth_line)
        .trim()
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .collect()
}
