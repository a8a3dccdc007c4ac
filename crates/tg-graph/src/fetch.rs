use async_trait::async_trait;
use tg_core::{FetchError, Issue, IssueRef};

/// Source of issue metadata. Any error aborts the accumulation run that
/// asked for it.
#[async_trait]
pub trait IssueFetcher: Send + Sync {
    async fn fetch(&self, reference: &IssueRef) -> Result<Issue, FetchError>;
}
