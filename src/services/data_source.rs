use crate::domain::record::IssueRecord;
use crate::domain::repository::RepositoryId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataSourceError {
    #[error("resource not found")]
    NotFound,
    #[error("connection error: {0}")]
    Connection(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("unauthorized")]
    Unauthorized,
    #[error("rate limit exceeded: {0}")]
    RateLimited(String),
    #[error("{0}")]
    Other(String),
}

/// Describes an interface for retrieving every issue and pull request of a repository.
///
/// Implementations return the complete record set or an error, never a partial one.
pub trait RecordSource {
    fn fetch_records(&self, repo: &RepositoryId) -> Result<Vec<IssueRecord>, DataSourceError>;
}
