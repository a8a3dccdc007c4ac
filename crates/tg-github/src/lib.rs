#![forbid(unsafe_code)]

//! GitHub as the issue tracker behind the task graph.

mod client;
mod credential;

pub use client::{ClientError, DEFAULT_API_BASE, GitHubClient, GitHubConfig, decode_issue};
pub use credential::{CredentialError, DEFAULT_TOKEN_PATH, load_access_token, resolve_token_path};
