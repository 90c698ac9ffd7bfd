//! Lightweight inspection of Cadence contract sources.
//!
//! Only what the engine needs is extracted: the name of the declared contract
//! or contract interface. Comments are stripped first so commented-out
//! declarations are never picked up.

use devsync_core::error::{Result, SyncError};
use regex::{Captures, Regex};
use std::sync::OnceLock;

static COMMENTS: OnceLock<Regex> = OnceLock::new();
static DECLARATION: OnceLock<Regex> = OnceLock::new();

fn comments() -> &'static Regex {
    // String literals are matched too so that `//` inside them survives
    COMMENTS.get_or_init(|| {
        Regex::new(r#""(?:\\.|[^"\\])*"|//[^\n]*|/\*[\s\S]*?\*/"#).expect("Invalid comment pattern")
    })
}

fn declaration() -> &'static Regex {
    DECLARATION.get_or_init(|| {
        Regex::new(
            r"(?m)^\s*(?:(?:access\s*\(\s*\w+\s*\)|pub(?:\s*\(\s*set\s*\))?|priv)\s+)?contract\s+(?:interface\s+)?([A-Za-z_][A-Za-z0-9_]*)",
        )
        .expect("Invalid declaration pattern")
    })
}

/// A parsed contract source file.
#[derive(Debug, Clone)]
pub struct Program {
    location: String,
    code: String,
}

impl Program {
    /// Parse raw file content. The content must be valid UTF-8.
    pub fn parse(content: &[u8], location: impl Into<String>) -> Result<Self> {
        let location = location.into();
        let source = std::str::from_utf8(content).map_err(|e| {
            SyncError::contract_parse(format!("{} is not valid UTF-8: {}", location, e))
        })?;

        let code = comments()
            .replace_all(source, |caps: &Captures| {
                let matched = &caps[0];
                if matched.starts_with('"') {
                    matched.to_string()
                } else {
                    // Keep line structure intact for multi-line comments
                    matched.chars().filter(|c| *c == '\n').collect::<String>() + " "
                }
            })
            .into_owned();

        Ok(Self { location, code })
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// Source with comments removed.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Name of the first contract or contract interface declared.
    pub fn name(&self) -> Result<String> {
        declaration()
            .captures(&self.code)
            .map(|caps| caps[1].to_string())
            .ok_or_else(|| {
                SyncError::contract_parse(format!(
                    "no contract declaration found in {}",
                    self.location
                ))
            })
    }
}
