use std::borrow::Cow;

use serde::Serialize;
use thiserror::Error;

/// Top-level error type returned by every snug-social operation.
#[derive(Debug, Error)]
pub enum SocialError {
    /// Missing, blank or self-referential arguments.
    #[error("invalid input: {message}")]
    InvalidInput { message: Cow<'static, str> },

    /// Referenced post, comment, reply or edge does not exist.
    #[error("{resource} not found: {id}")]
    NotFound { resource: Resource, id: String },

    /// Actor may not mutate a resource it does not own.
    #[error("forbidden: {message}")]
    Forbidden { message: Cow<'static, str> },

    /// Duplicate follow, friend request or caller-supplied comment id.
    #[error("conflict: {message}")]
    Conflict { message: Cow<'static, str> },

    /// Optimistic concurrency guard detected a stale read.
    #[error("stale write on {resource} {id} (expected version {expected:?}, actual {actual:?})")]
    StaleWrite {
        resource: Resource,
        id: String,
        expected: Option<u64>,
        actual: Option<u64>,
    },

    /// Underlying Redis command failed.
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Any other persistence failure (undecodable rows, aborted commits).
    #[error("storage failure: {message}")]
    Storage { message: Cow<'static, str> },
}

/// Coarse classification surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    Forbidden,
    Conflict,
    StorageFailure,
}

/// Kind of record an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Post,
    Comment,
    Reply,
    Edge,
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Resource::Post => "post",
            Resource::Comment => "comment",
            Resource::Reply => "reply",
            Resource::Edge => "edge",
        };
        f.write_str(name)
    }
}

impl SocialError {
    pub fn invalid(message: impl Into<Cow<'static, str>>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn not_found(resource: Resource, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource,
            id: id.into(),
        }
    }

    pub fn forbidden(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            SocialError::InvalidInput { .. } => ErrorKind::InvalidInput,
            SocialError::NotFound { .. } => ErrorKind::NotFound,
            SocialError::Forbidden { .. } => ErrorKind::Forbidden,
            SocialError::Conflict { .. } => ErrorKind::Conflict,
            SocialError::StaleWrite { .. } | SocialError::Redis(_) | SocialError::Storage { .. } => {
                ErrorKind::StorageFailure
            }
        }
    }

    /// True when a fresh read may let the same request succeed.
    pub fn is_stale(&self) -> bool {
        matches!(self, SocialError::StaleWrite { .. })
    }
}

/// Rejects empty or whitespace-only usernames and ids.
pub(crate) fn require_name(field: &'static str, value: &str) -> Result<(), SocialError> {
    if value.trim().is_empty() {
        return Err(SocialError::invalid(format!("{field} must not be empty")));
    }
    Ok(())
}

/// Rejects a pair of usernames that are empty or name the same user.
pub(crate) fn require_distinct_pair(
    left_field: &'static str,
    left: &str,
    right_field: &'static str,
    right: &str,
) -> Result<(), SocialError> {
    require_name(left_field, left)?;
    require_name(right_field, right)?;
    if left == right {
        return Err(SocialError::invalid(format!("{left_field} and {right_field} must differ")));
    }
    Ok(())
}
