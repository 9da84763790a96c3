//! Comment use-case service.
//!
//! # Responsibility
//! - Provide comment create/read/delete APIs scoped to a parent article.
//!
//! # Invariants
//! - A comment is only created for an existing article.
//! - Comment listings are oldest-first within one article.

use crate::model::article::ArticleId;
use crate::model::comment::{ArticleComment, CommentId};
use crate::repo::article_repo::RepoResult;
use crate::repo::comment_repo::CommentRepository;

/// Use-case service wrapper for comment operations.
pub struct CommentService<R: CommentRepository> {
    repo: R,
}

impl<R: CommentRepository> CommentService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Persists a new comment under the given article.
    pub fn add_comment(
        &mut self,
        article_id: ArticleId,
        content: impl Into<String>,
    ) -> RepoResult<ArticleComment> {
        let draft = ArticleComment::new(article_id, content);
        self.repo.save(&draft)
    }

    /// Gets one comment by id.
    pub fn get_comment(&mut self, id: CommentId) -> RepoResult<ArticleComment> {
        self.repo.find_by_id(id)
    }

    /// Lists all comments owned by one article, oldest first.
    pub fn comments_for(&mut self, article_id: ArticleId) -> RepoResult<Vec<ArticleComment>> {
        self.repo.find_by_article(article_id)
    }

    /// Saves an already-loaded comment, updating it in place.
    pub fn save(&mut self, comment: &ArticleComment) -> RepoResult<ArticleComment> {
        self.repo.save(comment)
    }

    /// Removes one comment.
    pub fn delete_comment(&mut self, id: CommentId) -> RepoResult<()> {
        self.repo.delete(id)
    }

    /// Total comment count.
    pub fn count(&mut self) -> RepoResult<u64> {
        self.repo.count()
    }
}
