//! Reference extraction from `[tasklist]` fenced blocks.
//!
//! An issue body is parsed as GitHub-flavoured markdown. Every fenced code
//! block whose language is exactly `[tasklist]` has its raw source re-parsed
//! as a markdown document of its own; inside that document plain text is
//! tried against the short reference form and autolinks to tracker issue
//! pages against the link form. Nothing outside a tasklist block is followed.

use comrak::nodes::{AstNode, NodeValue};
use comrak::{Arena, Options, parse_document};
use tg_core::{IssueRef, TRACKER_WEB_HOST};
use tracing::{debug, trace};
use url::Url;

use crate::reference::{parse_link, parse_short};

/// Language tag that marks a fenced block as a tasklist.
pub const TASKLIST_LANGUAGE: &str = "[tasklist]";

fn parse_markdown<'a>(arena: &'a Arena<AstNode<'a>>, source: &str) -> &'a AstNode<'a> {
    let mut options = Options::default();
    options.extension.autolink = true;
    options.extension.table = true;
    options.extension.tasklist = true;
    options.extension.strikethrough = true;
    parse_document(arena, source, &options)
}

/// Every reference inside the body's tasklist blocks, in document order, with
/// a missing owner or repository inherited from `parent`. Duplicates are kept.
#[must_use]
pub fn extract_references(body: &str, parent: &IssueRef) -> Vec<IssueRef> {
    if body.is_empty() {
        return Vec::new();
    }
    tasklist_blocks(body)
        .iter()
        .flat_map(|block| references_in_tasklist(block))
        .map(|reference| reference.inherit_from(parent))
        .inspect(|reference| debug!("next issue {reference}"))
        .collect()
}

/// Raw, unescaped source of each `[tasklist]` fenced block in `body`.
#[must_use]
pub fn tasklist_blocks(body: &str) -> Vec<String> {
    let arena = Arena::new();
    let root = parse_markdown(&arena, body);

    root.descendants()
        .filter_map(|node| match &node.data.borrow().value {
            NodeValue::CodeBlock(block) if block.fenced => {
                let language = block.info.split_whitespace().next().unwrap_or("");
                trace!("fenced block language {language:?}");
                (language == TASKLIST_LANGUAGE).then(|| block.literal.to_string())
            }
            _ => None,
        })
        .inspect(|source| trace!("tasklist block:\n{source}"))
        .collect()
}

/// References written inside one tasklist block's source, as parsed. Owner
/// and repository are left empty when the text omitted them.
#[must_use]
pub fn references_in_tasklist(source: &str) -> Vec<IssueRef> {
    let arena = Arena::new();
    let root = parse_markdown(&arena, source);
    let mut references = Vec::new();

    for node in root.descendants() {
        let parsed = match &node.data.borrow().value {
            NodeValue::Text(text) => {
                let candidate = text.trim();
                trace!("tasklist text {candidate:?}");
                parse_short(candidate)
                    .inspect_err(|err| trace!("skipping text: {err}"))
                    .ok()
            }
            NodeValue::Link(link) if is_autolink(node, &link.url) => issue_link(&link.url),
            _ => None,
        };
        references.extend(parsed);
    }

    references
}

fn issue_link(raw: &str) -> Option<IssueRef> {
    let url = match Url::parse(raw) {
        Ok(url) => url,
        Err(err) => {
            debug!("bad url {raw} - {err}");
            return None;
        }
    };
    trace!("tasklist link {url} [{:?}] [{}]", url.host_str(), url.path());
    if url.host_str() != Some(TRACKER_WEB_HOST) || !url.path().contains("/issues/") {
        return None;
    }
    parse_link(url.path())
        .inspect_err(|err| trace!("skipping link: {err}"))
        .ok()
}

/// An autolink is a link whose visible text is its own destination, as with
/// `<https://...>` or a bare URL.
fn is_autolink<'a>(node: &'a AstNode<'a>, url: &str) -> bool {
    let text: String = node
        .descendants()
        .skip(1)
        .filter_map(|child| match &child.data.borrow().value {
            NodeValue::Text(text) => Some(text.to_string()),
            _ => None,
        })
        .collect();

    url == text
        || url.strip_prefix("http://") == Some(text.as_str())
        || url.strip_prefix("mailto:") == Some(text.as_str())
}
