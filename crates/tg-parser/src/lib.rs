#![forbid(unsafe_code)]

//! Reading issue references out of issue bodies.

mod reference;
mod tasklist;

pub use reference::{ReferenceParseError, parse_link, parse_short};
pub use tasklist::{
    TASKLIST_LANGUAGE, extract_references, references_in_tasklist, tasklist_blocks,
};
