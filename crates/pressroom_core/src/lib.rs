//! Core persistence logic for the Pressroom article board.
//! This crate is the single source of truth for audit and cascade
//! invariants.

pub mod auditing;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use auditing::{
    ActingPrincipal, AuditClock, AuditError, Auditor, FixedPrincipal, SystemClock,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::article::{Article, ArticleId, ArticleValidationError};
pub use model::audit::{AuditStamp, AuditStampError};
pub use model::comment::{ArticleComment, CommentId, CommentValidationError};
pub use repo::article_repo::{
    ArticleRepository, PageQuery, RepoError, RepoResult, SqliteArticleRepository,
};
pub use repo::comment_repo::{CommentRepository, SqliteCommentRepository};
pub use service::article_service::{ArticleService, ComposeArticleRequest};
pub use service::comment_service::CommentService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
