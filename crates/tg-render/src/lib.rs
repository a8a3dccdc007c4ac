#![forbid(unsafe_code)]

//! Mermaid rendering of an accumulated task graph.

mod escape;
mod flowchart;
mod ids;
mod wrap;

pub use escape::{escape_html, escape_label};
pub use flowchart::{LEGEND, RenderError, render, render_with};
pub use ids::{DEFAULT_ID_BASE, IdAllocator, SequentialIds};
pub use wrap::{Wrapping, wrap};
