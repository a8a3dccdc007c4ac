//! Mermaid flowchart output for a [`TaskGraph`].
//!
//! Nodes are grouped into one subgraph per repository inside an outer
//! `Tasks` subgraph. Edges follow the subgraphs, then the fixed class
//! legend, then one `closed` class line per closed issue.

use std::collections::BTreeMap;
use std::fmt::Write;

use tg_core::{ConsistencyError, FlowDirection, IssueHandle, TaskGraph, ValidationError};
use thiserror::Error;
use tracing::debug;

use crate::escape::escape_label;
use crate::ids::{DEFAULT_ID_BASE, IdAllocator, SequentialIds};

const HEADER: &str = "---\ntitle: Task Graph\n---\n\nflowchart\n\nsubgraph Tasks\n";

/// Style classes emitted with every diagram, used or not.
pub const LEGEND: [(&str, &str); 8] = [
    ("closed", "fill:#ccc"),
    ("abandoned", "fill:#222222"),
    ("completed", "fill:#37e519"),
    ("review", "fill:#f55a00"),
    ("active", "fill:#e5b104"),
    ("parked", "fill:#b37fcd"),
    ("pending", "fill:#60a1ea"),
    ("staged", "fill:#f07ee9"),
];

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Consistency(#[from] ConsistencyError),
}

impl RenderError {
    #[must_use]
    pub const fn code(&self) -> tg_core::TaskGraphErrorCode {
        match self {
            Self::Validation(err) => err.code(),
            Self::Consistency(err) => err.code(),
        }
    }
}

/// Render `graph` with direction `TB` or `LR` and fresh sequential ids.
pub fn render(graph: &TaskGraph, direction: &str) -> Result<String, RenderError> {
    let direction = direction.parse::<FlowDirection>()?;
    render_with(graph, direction, &mut SequentialIds::new())
}

/// Render `graph` taking node identifiers from `ids`.
///
/// Fails before producing any text if a repository name is shared by two
/// owners.
pub fn render_with(
    graph: &TaskGraph,
    direction: FlowDirection,
    ids: &mut dyn IdAllocator,
) -> Result<String, RenderError> {
    let regions = group_by_repository(graph)?;
    debug!(
        "rendering {} issues in {} repositories",
        graph.node_count(),
        regions.len()
    );

    let mut output = String::from(HEADER);
    let _ = writeln!(output, "\n\tdirection {}", direction.as_str());

    for (index, (repo, members)) in regions.iter().enumerate() {
        let _ = write!(output, "\n\tsubgraph {}[\"{repo}\"]\n\n", region_id(index));
        for (identity, handle) in members {
            let id = ids.node_id(identity);
            let _ = writeln!(
                output,
                "\t\t{id}[\"{}\"]",
                escape_label(&handle.issue.title)
            );
            let _ = writeln!(
                output,
                "\t\tclick {id} href \"{}\" \"Open {identity}\"",
                handle.reference.web_url()
            );
            output.push('\n');
        }
        output.push_str("\n\tend\n");
    }

    for (source, targets) in &graph.edges {
        for target in targets {
            let source_id = ids.node_id(source);
            let target_id = ids.node_id(target);
            let _ = writeln!(output, "\t\t{source_id} --> {target_id}");
        }
    }

    output.push_str("\nend\n\nclassDef tasks fill:#fff\nclassDef projects fill:#eed\n\n");
    for (class, style) in LEGEND {
        let _ = writeln!(output, "classDef {class} {style}");
    }
    output.push_str("\nclass Tasks tasks;\n");

    for (identity, handle) in &graph.nodes {
        if handle.is_closed() {
            let _ = writeln!(output, "\tclass {} closed;", ids.node_id(identity));
        }
    }

    Ok(output)
}

type Region<'g> = Vec<(&'g str, &'g IssueHandle)>;

/// Nodes keyed by repository name. A repository name must belong to a
/// single owner across the graph.
fn group_by_repository(graph: &TaskGraph) -> Result<BTreeMap<&str, Region<'_>>, ConsistencyError> {
    let mut owners: BTreeMap<&str, &str> = BTreeMap::new();
    let mut regions: BTreeMap<&str, Region<'_>> = BTreeMap::new();

    for (identity, handle) in &graph.nodes {
        let reference = &handle.reference;
        let owner = *owners
            .entry(reference.repo.as_str())
            .or_insert(reference.owner.as_str());
        if owner != reference.owner {
            return Err(ConsistencyError {
                repo: reference.repo.clone(),
                owner: owner.to_string(),
                other_owner: reference.owner.clone(),
            });
        }
        regions
            .entry(reference.repo.as_str())
            .or_default()
            .push((identity.as_str(), handle));
    }

    Ok(regions)
}

/// Subgraph identifier for the `index`-th repository in name order. The
/// repository name only ever appears as the bracketed title.
fn region_id(index: usize) -> String {
    format!("repo{:04}", DEFAULT_ID_BASE + index)
}
