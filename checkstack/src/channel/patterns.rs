//! Prompt and login patterns used across jump-host and switch sessions.

use regex::bytes::Regex;

/// Substring shown by every password prompt ("Password:", "password for").
pub const PASSWORD: &str = "assword";

/// A password prompt waiting for input: `assword` at the end of the buffer.
pub const PASSWORD_PROMPT: &str = r"assword:?\s*$";

/// Jump-host shell prompt: a `$` at the end of the buffer.
pub const SHELL_PROMPT: &str = r"\$\s*$";

/// Switch privileged-mode prompt: a `#` at the end of the buffer.
pub const PRIVILEGED_PROMPT: &str = r"#\s*$";

/// OpenSSH asking to trust an unknown host key.
pub const HOST_KEY_CONFIRM: &str = r"\(yes/no[^)]*\)\?";

/// Messages from the nested ssh client that end a login attempt.
pub const LOGIN_REFUSED: &str = concat!(
    "(Permission denied|Connection refused|Could not resolve hostname",
    "|No route to host|Connection timed out|Connection closed by)[^\r\n]*"
);

/// Compile a prompt pattern string into a regex.
///
/// Anchors to the end of the buffer unless the pattern already is.
pub fn compile_prompt_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    let pattern = if pattern.ends_with('$') && !pattern.ends_with("\\$") {
        pattern.to_string()
    } else {
        format!("{}\\s*$", pattern)
    };

    Regex::new(&pattern)
}

/// Build a pattern that matches a discovered prompt literally.
pub fn literal_prompt(prompt: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("{}\\s*$", regex::escape(prompt)))
}
