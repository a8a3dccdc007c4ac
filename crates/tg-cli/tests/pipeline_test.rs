//! End-to-end tests: accumulate a task graph from an in-memory tracker and
//! render it.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use tg_core::{FetchError, Issue, IssueRef, IssueState};
use tg_graph::{AccumulateConfig, Accumulator, IssueFetcher};
use tg_render::{Wrapping, render, wrap};

#[derive(Default)]
struct Tracker {
    issues: HashMap<String, Issue>,
    fetched: Mutex<Vec<String>>,
}

impl Tracker {
    fn with(mut self, identity: &str, title: &str, state: IssueState, body: &str) -> Self {
        self.issues
            .insert(identity.to_string(), Issue::new(title, state, body));
        self
    }

    fn fetched(&self) -> Vec<String> {
        let mut fetched = self.fetched.lock().map(|f| f.clone()).unwrap_or_default();
        fetched.sort();
        fetched
    }
}

#[async_trait]
impl IssueFetcher for Tracker {
    async fn fetch(&self, reference: &IssueRef) -> Result<Issue, FetchError> {
        let identity = reference.identity();
        if let Ok(mut fetched) = self.fetched.lock() {
            fetched.push(identity.clone());
        }
        self.issues
            .get(&identity)
            .cloned()
            .ok_or_else(|| FetchError::new(reference.clone(), "404 Not Found"))
    }
}

const ROOT_BODY: &str = "Plan\n\n```[tasklist]\n- [ ] #2\n- [ ] other/proj#7\n```\n";

fn example_tracker() -> Tracker {
    Tracker::default()
        .with("me/repo#1", "Root", IssueState::Open, ROOT_BODY)
        .with("me/repo#2", "Child", IssueState::Open, "")
        .with("other/proj#7", "Elsewhere", IssueState::Closed, "")
}

#[tokio::test]
async fn example_graph_accumulates_and_renders() {
    let tracker = Arc::new(example_tracker());
    let graph = Accumulator::new(tracker.clone())
        .accumulate(&[IssueRef::new("me", "repo", 1)])
        .await
        .expect("accumulate");

    assert_eq!(graph.node_count(), 3);
    assert_eq!(
        graph.edges_from("me/repo#1"),
        Some(&["me/repo#2".to_string(), "other/proj#7".to_string()][..])
    );
    assert!(graph.edges_from("me/repo#2").is_some_and(<[String]>::is_empty));
    assert_eq!(
        tracker.fetched(),
        vec!["me/repo#1", "me/repo#2", "other/proj#7"]
    );

    let diagram = render(&graph, "LR").expect("render");
    assert!(diagram.starts_with("---\ntitle: Task Graph\n---\n\nflowchart\n\nsubgraph Tasks\n"));
    assert!(diagram.contains("\tdirection LR\n"));
    assert!(diagram.contains("\tsubgraph repo0100[\"proj\"]\n"));
    assert!(diagram.contains("\tsubgraph repo0101[\"repo\"]\n"));
    assert!(diagram.contains("\t\ttg0100[\"Elsewhere\"]\n"));
    assert!(diagram.contains("\t\ttg0101[\"Root\"]\n"));
    assert!(diagram.contains("\t\ttg0102[\"Child\"]\n"));
    assert!(diagram.contains(
        "\t\tclick tg0101 href \"https://github.com/me/repo/issues/1\" \"Open me/repo#1\"\n"
    ));
    assert!(diagram.contains("\t\ttg0101 --> tg0102\n"));
    assert!(diagram.contains("\t\ttg0101 --> tg0100\n"));
    assert!(diagram.trim_end().ends_with("\tclass tg0100 closed;"));
}

#[tokio::test]
async fn skip_closed_stops_at_closed_issue() {
    let tracker = Arc::new(
        Tracker::default()
            .with("me/repo#1", "Root", IssueState::Open, ROOT_BODY)
            .with("me/repo#2", "Child", IssueState::Open, "")
            .with(
                "other/proj#7",
                "Done",
                IssueState::Closed,
                "```[tasklist]\n- [ ] #8\n```\n",
            ),
    );
    let graph = Accumulator::new(tracker.clone())
        .with_config(AccumulateConfig::default().with_skip_closed(true))
        .accumulate(&[IssueRef::new("me", "repo", 1)])
        .await
        .expect("accumulate");

    assert!(graph.contains("other/proj#7"));
    assert!(!graph.contains("other/proj#8"));
    assert!(graph.edges_from("other/proj#7").is_some_and(<[String]>::is_empty));
    assert!(!tracker.fetched().contains(&"other/proj#8".to_string()));
}

#[tokio::test]
async fn missing_issue_fails_the_run() {
    let tracker = Arc::new(
        Tracker::default().with("me/repo#1", "Root", IssueState::Open, ROOT_BODY),
    );
    let err = Accumulator::new(tracker)
        .accumulate(&[IssueRef::new("me", "repo", 1)])
        .await
        .expect_err("child is missing");

    assert!(err.reference().is_some());
    assert!(err.to_string().contains("404"));
}

#[tokio::test]
async fn repository_shared_by_two_owners_fails_to_render() {
    let body = "```[tasklist]\n- [ ] them/repo#3\n```\n";
    let tracker = Arc::new(
        Tracker::default()
            .with("me/repo#1", "Mine", IssueState::Open, body)
            .with("them/repo#3", "Theirs", IssueState::Open, ""),
    );
    let graph = Accumulator::new(tracker)
        .accumulate(&[IssueRef::new("me", "repo", 1)])
        .await
        .expect("accumulate");

    let err = render(&graph, "TB").expect_err("same repository name, two owners");
    assert!(err.to_string().contains("repo"));
}

#[tokio::test]
async fn fenced_output_wraps_rendered_diagram() {
    let graph = Accumulator::new(Arc::new(example_tracker()))
        .accumulate(&[IssueRef::new("me", "repo", 1)])
        .await
        .expect("accumulate");
    let diagram = render(&graph, "TB").expect("render");

    let fenced = wrap(&diagram, Wrapping::Fence);
    assert!(fenced.starts_with("```mermaid\n---\ntitle: Task Graph"));
    assert!(fenced.ends_with("\n```\n"));
}
