//! Audit-stamp interceptor and acting-principal context.
//!
//! # Responsibility
//! - Resolve the ambient acting principal and clock for each write.
//! - Populate `AuditStamp` fields at the defined lifecycle points.
//!
//! # Invariants
//! - First persist: all four fields are set and `created_at == modified_at`.
//! - Updates: creation fields pass through untouched.
//! - `modified_at` never moves backward, even when the clock does.
//! - Stamping fails when no acting-principal context is available.

use crate::model::audit::{AuditStamp, ACTOR_MAX_CHARS};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};

static PRINCIPAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._@-]*$").expect("valid principal regex"));

/// Ambient source of the current acting principal.
///
/// Returns `None` when no principal context is available; audited writes are
/// rejected in that case rather than attributed to a placeholder.
pub trait ActingPrincipal {
    fn current_principal(&self) -> Option<String>;
}

/// Fixed principal for unattended/system operations.
#[derive(Debug, Clone)]
pub struct FixedPrincipal(String);

impl FixedPrincipal {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl ActingPrincipal for FixedPrincipal {
    fn current_principal(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

/// Time source for audit stamps, in epoch milliseconds.
pub trait AuditClock {
    fn now_epoch_ms(&self) -> i64;
}

/// Wall-clock time source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl AuditClock for SystemClock {
    fn now_epoch_ms(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_millis() as i64)
    }
}

/// Interceptor failure raised before any SQL mutation.
#[derive(Debug)]
pub enum AuditError {
    /// No acting-principal context is available for this write.
    MissingPrincipal,
    /// The resolved principal identifier is empty, over-long, or malformed.
    InvalidPrincipal(String),
}

impl Display for AuditError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingPrincipal => {
                write!(f, "no acting-principal context available for audited write")
            }
            Self::InvalidPrincipal(value) => write!(f, "invalid acting principal `{value}`"),
        }
    }
}

impl Error for AuditError {}

/// Audit interceptor invoked by repository save paths.
///
/// Owns the field-population rules; the stamp itself stays passive.
pub struct Auditor {
    principal: Box<dyn ActingPrincipal>,
    clock: Box<dyn AuditClock>,
}

impl Auditor {
    pub fn new(principal: Box<dyn ActingPrincipal>, clock: Box<dyn AuditClock>) -> Self {
        Self { principal, clock }
    }

    /// Fixed-principal auditor on the wall clock.
    pub fn system(principal: impl Into<String>) -> Self {
        Self::new(Box::new(FixedPrincipal::new(principal)), Box::new(SystemClock))
    }

    /// Produces the stamp for the write about to happen.
    ///
    /// # Contract
    /// - `prior == None` (first persist): all four fields come from the
    ///   current principal and clock, with `created_at == modified_at`.
    /// - `prior == Some` (update): creation fields are copied through;
    ///   `modified_by` is the current principal and
    ///   `modified_at = max(now, prior.modified_at)`.
    ///
    /// # Errors
    /// - `AuditError::MissingPrincipal` when no context is available.
    /// - `AuditError::InvalidPrincipal` when the identifier fails validation.
    pub fn stamp(&self, prior: Option<&AuditStamp>) -> Result<AuditStamp, AuditError> {
        let actor = self.resolve_principal()?;
        let now = self.clock.now_epoch_ms();

        Ok(match prior {
            None => AuditStamp {
                created_at: now,
                created_by: actor.clone(),
                modified_at: now,
                modified_by: actor,
            },
            Some(existing) => AuditStamp {
                created_at: existing.created_at,
                created_by: existing.created_by.clone(),
                modified_at: now.max(existing.modified_at),
                modified_by: actor,
            },
        })
    }

    fn resolve_principal(&self) -> Result<String, AuditError> {
        let raw = self
            .principal
            .current_principal()
            .ok_or(AuditError::MissingPrincipal)?;

        let trimmed = raw.trim();
        if trimmed.is_empty()
            || trimmed.chars().count() > ACTOR_MAX_CHARS
            || !PRINCIPAL_RE.is_match(trimmed)
        {
            return Err(AuditError::InvalidPrincipal(raw));
        }

        Ok(trimmed.to_string())
    }
}
