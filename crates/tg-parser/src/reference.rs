//! The two textual reference syntaxes found in issue bodies.
//!
//! - short form: `owner/repo#123`, `owner/long/path#123` or `#123`
//! - link form: `/owner/repo/issues/123` (the path of an issue URL)
//!
//! Both are anchored at both ends. Neither guesses a missing owner or
//! repository; callers inherit those from the enclosing item.

use std::sync::OnceLock;

use regex::{Captures, Regex};
use tg_core::{IssueRef, TaskGraphErrorCode};
use thiserror::Error;

const OWNER: &str = "[A-Za-z0-9_-]+";
const REPO_PATH: &str = "[A-Za-z0-9_.-]+(?:/[A-Za-z0-9_.-]+)*";

static SHORT_FORM_RE: OnceLock<Option<Regex>> = OnceLock::new();
static OWNER_ONLY_RE: OnceLock<Option<Regex>> = OnceLock::new();
static LINK_FORM_RE: OnceLock<Option<Regex>> = OnceLock::new();

fn short_form_re() -> Option<&'static Regex> {
    SHORT_FORM_RE
        .get_or_init(|| Regex::new(&format!(r"^(?:({OWNER})/({REPO_PATH}))?#([0-9]+)$")).ok())
        .as_ref()
}

fn owner_only_re() -> Option<&'static Regex> {
    OWNER_ONLY_RE
        .get_or_init(|| Regex::new(&format!(r"^{OWNER}#[0-9]+$")).ok())
        .as_ref()
}

fn link_form_re() -> Option<&'static Regex> {
    LINK_FORM_RE
        .get_or_init(|| Regex::new(&format!(r"^/({OWNER})/({REPO_PATH})/issues/([0-9]+)$")).ok())
        .as_ref()
}

/// Why a candidate string is not a reference. Never fatal: extraction
/// treats the candidate as ordinary text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReferenceParseError {
    #[error("not an issue reference: {0}")]
    NoMatch(String),
    #[error("reference {0} names an owner but no repository")]
    MissingRepository(String),
    #[error("invalid issue number in {0}")]
    InvalidNumber(String),
}

impl ReferenceParseError {
    #[must_use]
    pub const fn code(&self) -> TaskGraphErrorCode {
        TaskGraphErrorCode::Parse
    }
}

/// Parse `owner/repo#n` or `#n`. The `#n` form yields an empty owner and
/// repository.
pub fn parse_short(text: &str) -> Result<IssueRef, ReferenceParseError> {
    let no_match = || ReferenceParseError::NoMatch(text.to_string());
    let Some(captures) = short_form_re().and_then(|re| re.captures(text)) else {
        if owner_only_re().is_some_and(|re| re.is_match(text)) {
            return Err(ReferenceParseError::MissingRepository(text.to_string()));
        }
        return Err(no_match());
    };

    let owner = group(&captures, 1);
    let repo = group(&captures, 2);
    let number = parse_number(text, group(&captures, 3))?;
    Ok(IssueRef::new(owner, repo, number))
}

/// Parse the path of an issue URL, `/owner/repo/issues/n`. A path without the
/// leading slash does not match.
pub fn parse_link(path: &str) -> Result<IssueRef, ReferenceParseError> {
    let captures = link_form_re()
        .and_then(|re| re.captures(path))
        .ok_or_else(|| ReferenceParseError::NoMatch(path.to_string()))?;

    let owner = group(&captures, 1);
    let repo = group(&captures, 2);
    let number = parse_number(path, group(&captures, 3))?;
    Ok(IssueRef::new(owner, repo, number))
}

fn group<'t>(captures: &Captures<'t>, index: usize) -> &'t str {
    captures.get(index).map_or("", |m| m.as_str())
}

fn parse_number(source: &str, digits: &str) -> Result<u64, ReferenceParseError> {
    match digits.parse::<u64>() {
        Ok(number) if number > 0 => Ok(number),
        _ => Err(ReferenceParseError::InvalidNumber(source.to_string())),
    }
}
