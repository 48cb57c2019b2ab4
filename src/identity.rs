//! Extraction of the owner/name pair from a user-supplied repository URL.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A unique identifier for a GitHub repository.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryIdentity {
    /// The owner of the repository (e.g., "tensorflow").
    pub owner: String,
    /// The name of the repository (e.g., "tensorflow").
    pub name: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("malformed repository URL '{input}': expected at least an owner and a name")]
    MalformedInput { input: String },
}

impl RepositoryIdentity {
    /// Parses the last two non-empty `/`-separated segments as owner and name.
    ///
    /// No URL validation happens here: `https://github.com/rust-lang/rust` and
    /// `rust-lang/rust` both yield `rust-lang/rust`, and extra path segments
    /// shift which pair is picked.
    pub fn parse(input: &str) -> Result<Self, IdentityError> {
        let mut segments = input.trim().split('/').filter(|s| !s.is_empty()).rev();

        match (segments.next(), segments.next()) {
            (Some(name), Some(owner)) => Ok(Self {
                owner: owner.to_string(),
                name: name.to_string(),
            }),
            _ => Err(IdentityError::MalformedInput {
                input: input.to_string(),
            }),
        }
    }
}

impl fmt::Display for RepositoryIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}
