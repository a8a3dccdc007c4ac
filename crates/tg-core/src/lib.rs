#![forbid(unsafe_code)]

//! Data model shared by every task-graph crate.
//!
//! An [`IssueRef`] names an item in the tracker, an [`Issue`] is what the
//! tracker returned for it, and a [`TaskGraph`] is the closed-world result of
//! one accumulation run, keyed by canonical reference identity.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Web host of the issue tracker. Used to recognise issue links in bodies
/// and to build click-through links in rendered diagrams.
pub const TRACKER_WEB_HOST: &str = "github.com";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IssueRef {
    pub owner: String,
    pub repo: String,
    pub number: u64,
}

impl IssueRef {
    #[must_use]
    pub fn new(owner: impl Into<String>, repo: impl Into<String>, number: u64) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            number,
        }
    }

    /// A reference with no owner or repository, written `#n` in a body.
    #[must_use]
    pub fn local(number: u64) -> Self {
        Self::new("", "", number)
    }

    /// Canonical identity: `owner/repo#n`, or `#n` when owner or repo is empty.
    #[must_use]
    pub fn identity(&self) -> String {
        self.to_string()
    }

    #[must_use]
    pub fn is_qualified(&self) -> bool {
        !self.owner.is_empty() && !self.repo.is_empty()
    }

    /// Fill an empty owner and/or repository from the item the reference was
    /// found in.
    #[must_use]
    pub fn inherit_from(mut self, parent: &Self) -> Self {
        if self.owner.is_empty() {
            self.owner.clone_from(&parent.owner);
        }
        if self.repo.is_empty() {
            self.repo.clone_from(&parent.repo);
        }
        self
    }

    #[must_use]
    pub fn web_url(&self) -> String {
        format!(
            "https://{TRACKER_WEB_HOST}/{}/{}/issues/{}",
            self.owner, self.repo, self.number
        )
    }
}

impl fmt::Display for IssueRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_qualified() {
            write!(f, "{}/{}#{}", self.owner, self.repo, self.number)
        } else {
            write!(f, "{}{}#{}", self.owner, self.repo, self.number)
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    #[default]
    Open,
    Closed,
}

impl IssueState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }

    #[must_use]
    pub const fn is_closed(self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl FromStr for IssueState {
    type Err = UnknownIssueState;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "open" => Ok(Self::Open),
            "closed" => Ok(Self::Closed),
            other => Err(UnknownIssueState(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown issue state: {0}")]
pub struct UnknownIssueState(pub String);

/// Metadata fetched for one reference. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Issue {
    pub title: String,
    pub state: IssueState,
    /// Raw markdown body, empty when the tracker returned none.
    pub body: String,
}

impl Issue {
    #[must_use]
    pub fn new(title: impl Into<String>, state: IssueState, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            state,
            body: body.into(),
        }
    }
}

/// A visited node: the reference that was fetched and what came back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueHandle {
    pub reference: IssueRef,
    pub issue: Issue,
}

impl IssueHandle {
    #[must_use]
    pub fn identity(&self) -> String {
        self.reference.identity()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.issue.state.is_closed()
    }
}

/// Nodes and edges keyed by canonical identity.
///
/// An identity absent from `edges` has not been visited; a visited node with
/// no outgoing references maps to an empty list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TaskGraph {
    pub nodes: BTreeMap<String, IssueHandle>,
    pub edges: BTreeMap<String, Vec<String>>,
}

impl TaskGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contains(&self, identity: &str) -> bool {
        self.nodes.contains_key(identity)
    }

    #[must_use]
    pub fn node(&self, identity: &str) -> Option<&IssueHandle> {
        self.nodes.get(identity)
    }

    #[must_use]
    pub fn edges_from(&self, identity: &str) -> Option<&[String]> {
        self.edges.get(identity).map(Vec::as_slice)
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }

    /// Edge targets that never became nodes. Empty for a finished run.
    #[must_use]
    pub fn dangling_targets(&self) -> Vec<&str> {
        self.edges
            .values()
            .flatten()
            .filter(|target| !self.nodes.contains_key(target.as_str()))
            .map(String::as_str)
            .collect()
    }
}

/// Flow direction of the rendered diagram.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum FlowDirection {
    #[default]
    TB,
    LR,
}

impl FlowDirection {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TB => "TB",
            Self::LR => "LR",
        }
    }
}

impl FromStr for FlowDirection {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "TB" => Ok(Self::TB),
            "LR" => Ok(Self::LR),
            other => Err(ValidationError::Direction(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum TaskGraphErrorCode {
    #[default]
    Parse,
    Fetch,
    Consistency,
    Validation,
}

impl TaskGraphErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Parse => "task-graph/error/parse",
            Self::Fetch => "task-graph/error/fetch",
            Self::Consistency => "task-graph/error/consistency",
            Self::Validation => "task-graph/error/validation",
        }
    }
}

/// The tracker could not produce an item for `reference`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("failed to fetch {reference}: {message}")]
pub struct FetchError {
    pub reference: IssueRef,
    pub message: String,
}

impl FetchError {
    #[must_use]
    pub fn new(reference: IssueRef, message: impl Into<String>) -> Self {
        Self {
            reference,
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn code(&self) -> TaskGraphErrorCode {
        TaskGraphErrorCode::Fetch
    }
}

/// One repository name observed under two owners.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("duplicate repo {repo} with distinct owners {owner} != {other_owner}")]
pub struct ConsistencyError {
    pub repo: String,
    pub owner: String,
    pub other_owner: String,
}

impl ConsistencyError {
    #[must_use]
    pub const fn code(&self) -> TaskGraphErrorCode {
        TaskGraphErrorCode::Consistency
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("bad graph direction: {0}")]
    Direction(String),
}

impl ValidationError {
    #[must_use]
    pub const fn code(&self) -> TaskGraphErrorCode {
        TaskGraphErrorCode::Validation
    }
}

#[cfg(test)]
mod tests {
    use super::{
        FetchError, FlowDirection, Issue, IssueHandle, IssueRef, IssueState, TaskGraph,
        TaskGraphErrorCode, ValidationError,
    };

    fn handle(reference: IssueRef, state: IssueState) -> IssueHandle {
        IssueHandle {
            reference,
            issue: Issue::new("title", state, ""),
        }
    }

    #[test]
    fn identity_includes_owner_and_repo() {
        let reference = IssueRef::new("me", "repo", 1);
        assert_eq!(reference.identity(), "me/repo#1");
    }

    #[test]
    fn identity_of_local_reference_is_bare_number() {
        assert_eq!(IssueRef::local(42).identity(), "#42");
    }

    #[test]
    fn identity_keeps_multi_segment_repository() {
        let reference = IssueRef::new("resystems-io", "this/and/that", 123);
        assert_eq!(reference.identity(), "resystems-io/this/and/that#123");
    }

    #[test]
    fn inherit_fills_only_missing_parts() {
        let parent = IssueRef::new("me", "repo", 1);
        assert_eq!(
            IssueRef::local(2).inherit_from(&parent),
            IssueRef::new("me", "repo", 2)
        );
        assert_eq!(
            IssueRef::new("other", "proj", 7).inherit_from(&parent),
            IssueRef::new("other", "proj", 7)
        );
    }

    #[test]
    fn web_url_points_at_tracker_issue_page() {
        let reference = IssueRef::new("me", "repo", 9);
        assert_eq!(reference.web_url(), "https://github.com/me/repo/issues/9");
    }

    #[test]
    fn issue_state_string_mapping_is_stable() {
        assert_eq!(IssueState::Open.as_str(), "open");
        assert_eq!(IssueState::Closed.as_str(), "closed");
        assert_eq!("closed".parse::<IssueState>(), Ok(IssueState::Closed));
        assert!("merged".parse::<IssueState>().is_err());
    }

    #[test]
    fn issue_state_deserializes_lowercase() {
        let state: IssueState = serde_json::from_str("\"closed\"").expect("state");
        assert_eq!(state, IssueState::Closed);
    }

    #[test]
    fn direction_accepts_only_tb_and_lr() {
        assert_eq!("TB".parse::<FlowDirection>(), Ok(FlowDirection::TB));
        assert_eq!("LR".parse::<FlowDirection>(), Ok(FlowDirection::LR));
        assert_eq!(
            "RL".parse::<FlowDirection>(),
            Err(ValidationError::Direction("RL".to_string()))
        );
        assert!("tb".parse::<FlowDirection>().is_err());
    }

    #[test]
    fn graph_distinguishes_unvisited_from_visited_without_edges() {
        let mut graph = TaskGraph::new();
        let reference = IssueRef::new("me", "repo", 1);
        graph.nodes.insert(
            reference.identity(),
            handle(reference.clone(), IssueState::Open),
        );
        graph.edges.insert(reference.identity(), Vec::new());

        assert!(graph.edges_from("me/repo#1").is_some_and(<[String]>::is_empty));
        assert_eq!(graph.edges_from("me/repo#2"), None);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn dangling_targets_reports_missing_nodes() {
        let mut graph = TaskGraph::new();
        let root = IssueRef::new("me", "repo", 1);
        graph
            .nodes
            .insert(root.identity(), handle(root.clone(), IssueState::Closed));
        graph
            .edges
            .insert(root.identity(), vec!["me/repo#2".to_string()]);

        assert_eq!(graph.dangling_targets(), vec!["me/repo#2"]);
        assert!(graph.node("me/repo#1").is_some_and(IssueHandle::is_closed));
    }

    #[test]
    fn error_code_strings_are_stable() {
        let error = FetchError::new(IssueRef::new("me", "repo", 3), "boom");
        assert_eq!(error.code(), TaskGraphErrorCode::Fetch);
        assert_eq!(error.to_string(), "failed to fetch me/repo#3: boom");
        assert_eq!(
            TaskGraphErrorCode::Consistency.as_str(),
            "task-graph/error/consistency"
        );
        assert_eq!(
            ValidationError::Direction("XY".to_string()).code().as_str(),
            "task-graph/error/validation"
        );
    }
}
