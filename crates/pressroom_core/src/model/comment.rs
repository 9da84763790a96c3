//! Article comment domain model.
//!
//! # Responsibility
//! - Define the dependent child record owned by an article.
//!
//! # Invariants
//! - Every comment references an existing article via `article_id`.
//! - Comment lifetime is bounded by the parent article.

use crate::model::article::ArticleId;
use crate::model::audit::{AuditStamp, AuditStampError};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Stable storage-assigned identifier for comments.
pub type CommentId = i64;

/// Maximum comment body length, in characters.
pub const COMMENT_MAX_CHARS: usize = 500;

/// Dependent child record of an article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleComment {
    /// `None` for drafts, assigned by storage on first save.
    pub id: Option<CommentId>,
    /// Owning parent article.
    pub article_id: ArticleId,
    /// Comment body. Required, non-empty.
    pub content: String,
    /// Optimistic-lock counter, bumped by every successful update.
    pub version: i64,
    /// Audit metadata. `None` until the first successful persist.
    pub audit: Option<AuditStamp>,
}

/// Validation failure for a comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentValidationError {
    EmptyContent,
    ContentTooLong { chars: usize },
    Audit(AuditStampError),
}

impl Display for CommentValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyContent => write!(f, "comment content must not be empty"),
            Self::ContentTooLong { chars } => {
                write!(f, "comment content has {chars} chars, max {COMMENT_MAX_CHARS}")
            }
            Self::Audit(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CommentValidationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Audit(err) => Some(err),
            _ => None,
        }
    }
}

impl From<AuditStampError> for CommentValidationError {
    fn from(value: AuditStampError) -> Self {
        Self::Audit(value)
    }
}

impl ArticleComment {
    /// Creates a not-yet-persisted comment draft for the given article.
    pub fn new(article_id: ArticleId, content: impl Into<String>) -> Self {
        Self {
            id: None,
            article_id,
            content: content.into(),
            version: 0,
            audit: None,
        }
    }

    /// Checks field rules and, when present, the audit stamp.
    pub fn validate(&self) -> Result<(), CommentValidationError> {
        if self.content.trim().is_empty() {
            return Err(CommentValidationError::EmptyContent);
        }

        let chars = self.content.chars().count();
        if chars > COMMENT_MAX_CHARS {
            return Err(CommentValidationError::ContentTooLong { chars });
        }

        if let Some(stamp) = self.audit.as_ref() {
            stamp.validate()?;
        }

        Ok(())
    }
}
