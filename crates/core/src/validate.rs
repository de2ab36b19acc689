// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared slug validation for team and worker names.
//!
//! Both names follow the same shape (lowercase alphanumeric, hyphen
//! separated, must start with an alphanumeric) but differ in maximum
//! length, so the check is parameterized rather than duplicated per type.

use std::sync::OnceLock;

use regex::Regex;

#[allow(clippy::expect_used)]
fn slug_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9-]*$").expect("static regex is valid"))
}

/// Validate a slug-shaped name: starts with a lowercase letter or digit,
/// followed by lowercase letters, digits, or hyphens, up to `max_len`
/// characters total.
pub fn validate_slug(name: &str, max_len: usize) -> Result<(), SlugError> {
    if name.is_empty() {
        return Err(SlugError::Empty);
    }
    if name.len() > max_len {
        return Err(SlugError::TooLong {
            max_len,
            actual: name.len(),
        });
    }
    if !slug_pattern().is_match(name) {
        return Err(SlugError::BadShape);
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SlugError {
    #[error("name must not be empty")]
    Empty,
    #[error("name must be at most {max_len} characters, got {actual}")]
    TooLong { max_len: usize, actual: usize },
    #[error("name must start with a lowercase letter or digit and contain only lowercase letters, digits, and hyphens")]
    BadShape,
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
