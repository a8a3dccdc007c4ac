//! Access-token loading.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

pub const DEFAULT_TOKEN_PATH: &str = "~/.config/task-graph/github_access_token";

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("cannot expand token path {path}: {message}")]
    Expand { path: String, message: String },
    #[error("cannot read access token from {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("access token file {} is empty", .0.display())]
    Empty(PathBuf),
}

/// Expand a leading `~` and any `$VAR` in `path`.
pub fn resolve_token_path(path: &str) -> Result<PathBuf, CredentialError> {
    shellexpand::full(path)
        .map(|expanded| PathBuf::from(expanded.as_ref()))
        .map_err(|err| CredentialError::Expand {
            path: path.to_string(),
            message: err.to_string(),
        })
}

/// Read the bearer token stored at `path`, dropping trailing whitespace.
pub fn load_access_token(path: &str) -> Result<String, CredentialError> {
    let resolved = resolve_token_path(path)?;
    read_token_file(&resolved)
}

fn read_token_file(path: &Path) -> Result<String, CredentialError> {
    let raw = std::fs::read_to_string(path).map_err(|source| CredentialError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let token = raw.trim_end_matches(['\n', '\r', '\t', ' ']);
    if token.is_empty() {
        return Err(CredentialError::Empty(path.to_path_buf()));
    }
    debug!("loaded access token from {}", path.display());
    Ok(token.to_string())
}
