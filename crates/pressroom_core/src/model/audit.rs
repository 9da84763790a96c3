//! Audit metadata carried by every persisted record.
//!
//! # Responsibility
//! - Define the creation/modification field set shared by all entities.
//! - Validate stamp invariants before they reach storage.
//!
//! # Invariants
//! - `created_at <= modified_at` for every persisted stamp.
//! - Creation fields are written once; update paths never touch them.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Maximum length of an acting-principal identifier, in characters.
pub const ACTOR_MAX_CHARS: usize = 100;

/// Creation/modification metadata populated by the auditing interceptor.
///
/// The stamp is a passive holder: it performs no I/O and never decides its
/// own values. `crate::auditing::Auditor` owns the population rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStamp {
    /// First-persist time in epoch milliseconds. Written exactly once.
    pub created_at: i64,
    /// Acting principal at creation time. Written exactly once.
    pub created_by: String,
    /// Time of the most recent successful write, epoch milliseconds.
    pub modified_at: i64,
    /// Acting principal attributed to the most recent write.
    pub modified_by: String,
}

/// Validation failure for a single audit stamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditStampError {
    /// An actor field is empty.
    MissingActor(&'static str),
    /// An actor field exceeds `ACTOR_MAX_CHARS`.
    ActorTooLong { field: &'static str, chars: usize },
    /// Creation time is later than modification time.
    CreatedAfterModified { created_at: i64, modified_at: i64 },
}

impl Display for AuditStampError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingActor(field) => write!(f, "audit field `{field}` must not be empty"),
            Self::ActorTooLong { field, chars } => write!(
                f,
                "audit field `{field}` has {chars} chars, max {ACTOR_MAX_CHARS}"
            ),
            Self::CreatedAfterModified {
                created_at,
                modified_at,
            } => write!(
                f,
                "created_at {created_at} is later than modified_at {modified_at}"
            ),
        }
    }
}

impl Error for AuditStampError {}

impl AuditStamp {
    /// Checks stamp invariants.
    ///
    /// # Errors
    /// - Empty or over-long actor fields.
    /// - `created_at` later than `modified_at`.
    pub fn validate(&self) -> Result<(), AuditStampError> {
        validate_actor("created_by", self.created_by.as_str())?;
        validate_actor("modified_by", self.modified_by.as_str())?;

        if self.created_at > self.modified_at {
            return Err(AuditStampError::CreatedAfterModified {
                created_at: self.created_at,
                modified_at: self.modified_at,
            });
        }

        Ok(())
    }
}

fn validate_actor(field: &'static str, value: &str) -> Result<(), AuditStampError> {
    if value.is_empty() {
        return Err(AuditStampError::MissingActor(field));
    }

    let chars = value.chars().count();
    if chars > ACTOR_MAX_CHARS {
        return Err(AuditStampError::ActorTooLong { field, chars });
    }

    Ok(())
}
