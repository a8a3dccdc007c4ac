#![forbid(unsafe_code)]

//! Discovery of the issue task graph.
//!
//! Starting from one or more root references, an [`Accumulator`] fetches
//! items wave by wave through an [`IssueFetcher`], follows the references in
//! their tasklist blocks and returns the closed-world [`tg_core::TaskGraph`].

mod accumulate;
mod fetch;
mod logger;

pub use accumulate::{AccumulateConfig, AccumulateError, Accumulator, DEFAULT_MAX_IN_FLIGHT};
pub use fetch::IssueFetcher;
pub use logger::Logger;
