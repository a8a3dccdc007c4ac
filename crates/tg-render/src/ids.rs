//! Synthetic node identifiers for the flowchart.

use std::collections::HashMap;

/// First identifier handed out by [`SequentialIds`].
pub const DEFAULT_ID_BASE: usize = 100;

/// Maps a node's canonical identity to the identifier used in the diagram.
///
/// The same identity must get the same identifier for the lifetime of the
/// allocator.
pub trait IdAllocator {
    fn node_id(&mut self, identity: &str) -> String;
}

/// `tg0100`, `tg0101`, ... in order of first request.
#[derive(Debug, Clone)]
pub struct SequentialIds {
    next: usize,
    assigned: HashMap<String, String>,
}

impl SequentialIds {
    #[must_use]
    pub fn new() -> Self {
        Self::starting_at(DEFAULT_ID_BASE)
    }

    #[must_use]
    pub fn starting_at(base: usize) -> Self {
        Self {
            next: base,
            assigned: HashMap::new(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new()
    }
}

impl IdAllocator for SequentialIds {
    fn node_id(&mut self, identity: &str) -> String {
        if let Some(id) = self.assigned.get(identity) {
            return id.clone();
        }
        let id = format!("tg{:04}", self.next);
        self.next += 1;
        self.assigned.insert(identity.to_string(), id.clone());
        id
    }
}
