use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RepositoryIdError {
    #[error("expected the repository as org/name, got '{0}'")]
    MissingSlash(String),
    #[error("repository path must contain exactly one slash: '{0}'")]
    TooManySegments(String),
    #[error("organization and repository name must not be empty: '{0}'")]
    EmptySegment(String),
}

/// Identifies a hosted repository by organization and name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryId {
    pub org: String,
    pub name: String,
}

impl FromStr for RepositoryId {
    type Err = RepositoryIdError;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        let segments: Vec<&str> = path.split('/').collect();
        match segments.as_slice() {
            [_] => Err(RepositoryIdError::MissingSlash(path.to_string())),
            [org, name] if org.is_empty() || name.is_empty() => {
                Err(RepositoryIdError::EmptySegment(path.to_string()))
            }
            [org, name] => Ok(Self {
                org: (*org).to_string(),
                name: (*name).to_string(),
            }),
            _ => Err(RepositoryIdError::TooManySegments(path.to_string())),
        }
    }
}

impl fmt::Display for RepositoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.org, self.name)
    }
}
