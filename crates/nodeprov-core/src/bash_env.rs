//! Restricted shell-variable files (openrc)
//!
//! Accepted dialect, one assignment per line:
//!
//! ```text
//! # comment
//! export OS_USERNAME=ci
//! OS_AUTH_URL="https://identity.example.com/v2.0/"
//! ```
//!
//! Values end up unquoted on remote command lines, so anything a shell
//! would interpret is rejected here rather than escaped later.

use crate::env::Environment;
use crate::error::{CoreError, Result};
use std::path::Path;
use tracing::{debug, info};

const UNSAFE_CHARS: &[char] = &[
    '\'', '"', '\\', '$', '`', ';', '&', '|', '<', '>', '(', ')',
];

fn strip_quotes(s: &str) -> &str {
    if s.len() >= 2
        && ((s.starts_with('"') && s.ends_with('"')) || (s.starts_with('\'') && s.ends_with('\'')))
    {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

/// Whether `value` can appear unquoted in a `KEY=VALUE` assignment.
pub fn is_shell_safe(value: &str) -> bool {
    !value
        .chars()
        .any(|c| c.is_whitespace() || UNSAFE_CHARS.contains(&c))
}

fn is_valid_key(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Parse one line: `Ok(None)` for blanks and comments.
fn parse_line(line: &str) -> std::result::Result<Option<(String, String)>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let assignment = line.strip_prefix("export ").map(str::trim_start).unwrap_or(line);
    let Some((key, raw_value)) = assignment.split_once('=') else {
        return Err(format!("expected KEY=VALUE, found \"{line}\""));
    };

    if !is_valid_key(key) {
        return Err(format!("invalid variable name \"{key}\""));
    }

    let value = strip_quotes(raw_value);
    if !is_shell_safe(value) {
        return Err(format!("value of {key} contains whitespace or shell metacharacters"));
    }

    Ok(Some((key.to_string(), value.to_string())))
}

/// Every problem in `text`, each prefixed with its 1-based line number.
pub fn parsing_issues(text: &str) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    let mut issues = Vec::new();

    for (index, line) in text.lines().enumerate() {
        match parse_line(line) {
            Ok(Some((key, _))) => {
                if seen.contains(&key) {
                    issues.push(format!("Line {}: {key} is assigned more than once", index + 1));
                } else {
                    seen.push(key);
                }
            }
            Ok(None) => {}
            Err(message) => issues.push(format!("Line {}: {message}", index + 1)),
        }
    }

    issues
}

/// Parse `text` into an ordered environment.
///
/// Fails with every issue found, not just the first.
pub fn parse(text: &str) -> std::result::Result<Environment, Vec<String>> {
    let issues = parsing_issues(text);
    if !issues.is_empty() {
        return Err(issues);
    }

    let mut env = Environment::new();
    for line in text.lines() {
        if let Ok(Some((key, value))) = parse_line(line) {
            debug!(key = %key, "Imported parameter");
            env.set(key, value);
        }
    }
    Ok(env)
}

/// Read and parse a parameter file.
#[tracing::instrument]
pub fn load(path: &Path) -> Result<Environment> {
    let text = std::fs::read_to_string(path).map_err(|e| CoreError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let env = parse(&text).map_err(|issues| CoreError::EnvFile {
        path: path.to_path_buf(),
        issues,
    })?;

    info!(variable_count = env.len(), "Loaded parameter file");
    Ok(env)
}
