//! Article domain model.
//!
//! # Responsibility
//! - Define the parent record of the article board.
//! - Provide constructors for not-yet-persisted drafts.
//!
//! # Invariants
//! - `id` is `None` until the first successful persist, `Some` afterwards.
//! - `audit` follows `id`: populated by the interceptor at first persist.
//! - Deleting an article removes every comment that references it.

use crate::model::audit::{AuditStamp, AuditStampError};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Stable storage-assigned identifier for articles.
pub type ArticleId = i64;

/// Maximum article title length, in characters.
pub const TITLE_MAX_CHARS: usize = 255;
/// Maximum hashtag length, in characters.
pub const HASHTAG_MAX_CHARS: usize = 255;

/// Parent record owning zero or more comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    /// `None` for drafts, assigned by storage on first save.
    pub id: Option<ArticleId>,
    /// Display title. Required, non-empty.
    pub title: String,
    /// Article body.
    pub content: String,
    /// Optional free-form tag, e.g. `#abcd`.
    pub hashtag: Option<String>,
    /// Optimistic-lock counter, bumped by every successful update.
    pub version: i64,
    /// Audit metadata. `None` until the first successful persist.
    pub audit: Option<AuditStamp>,
}

/// Validation failure for an article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArticleValidationError {
    EmptyTitle,
    TitleTooLong { chars: usize },
    HashtagTooLong { chars: usize },
    Audit(AuditStampError),
}

impl Display for ArticleValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "article title must not be empty"),
            Self::TitleTooLong { chars } => {
                write!(f, "article title has {chars} chars, max {TITLE_MAX_CHARS}")
            }
            Self::HashtagTooLong { chars } => {
                write!(f, "hashtag has {chars} chars, max {HASHTAG_MAX_CHARS}")
            }
            Self::Audit(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ArticleValidationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Audit(err) => Some(err),
            _ => None,
        }
    }
}

impl From<AuditStampError> for ArticleValidationError {
    fn from(value: AuditStampError) -> Self {
        Self::Audit(value)
    }
}

impl Article {
    /// Creates a not-yet-persisted draft.
    ///
    /// # Invariants
    /// - `id` and `audit` start as `None`; the save path assigns both.
    /// - `version` starts at 0.
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        hashtag: Option<String>,
    ) -> Self {
        Self {
            id: None,
            title: title.into(),
            content: content.into(),
            hashtag,
            version: 0,
            audit: None,
        }
    }

    /// Returns whether this article has been persisted at least once.
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Checks field rules and, when present, the audit stamp.
    pub fn validate(&self) -> Result<(), ArticleValidationError> {
        if self.title.trim().is_empty() {
            return Err(ArticleValidationError::EmptyTitle);
        }

        let title_chars = self.title.chars().count();
        if title_chars > TITLE_MAX_CHARS {
            return Err(ArticleValidationError::TitleTooLong { chars: title_chars });
        }

        if let Some(hashtag) = self.hashtag.as_deref() {
            let chars = hashtag.chars().count();
            if chars > HASHTAG_MAX_CHARS {
                return Err(ArticleValidationError::HashtagTooLong { chars });
            }
        }

        if let Some(stamp) = self.audit.as_ref() {
            stamp.validate()?;
        }

        Ok(())
    }
}
