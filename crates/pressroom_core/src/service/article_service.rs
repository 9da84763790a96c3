//! Article use-case service.
//!
//! # Responsibility
//! - Provide stable CRUD entry points for core callers.
//! - Delegate persistence to repository implementations.
//!
//! # Invariants
//! - Service APIs never bypass repository validation/auditing contracts.
//! - Service layer remains storage-agnostic.

use crate::model::article::{Article, ArticleId};
use crate::repo::article_repo::{ArticleRepository, PageQuery, RepoResult};

/// Request model for composing a new article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeArticleRequest {
    pub title: String,
    pub content: String,
    pub hashtag: Option<String>,
}

/// Use-case service wrapper for article CRUD operations.
pub struct ArticleService<R: ArticleRepository> {
    repo: R,
}

impl<R: ArticleRepository> ArticleService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Persists a new article from compose input.
    ///
    /// # Contract
    /// - The returned article carries its assigned id and a fresh audit
    ///   stamp with `created_at == modified_at`.
    pub fn compose(&mut self, request: &ComposeArticleRequest) -> RepoResult<Article> {
        let draft = Article::new(
            request.title.clone(),
            request.content.clone(),
            request.hashtag.clone(),
        );
        self.repo.save(&draft)
    }

    /// Gets one article by id.
    pub fn get_article(&mut self, id: ArticleId) -> RepoResult<Article> {
        self.repo.find_by_id(id)
    }

    /// Lists articles using pagination options.
    pub fn list_articles(&mut self, page: &PageQuery) -> RepoResult<Vec<Article>> {
        self.repo.find_all(page)
    }

    /// Saves an already-loaded article, updating it in place.
    ///
    /// Returns repository-level not-found, conflict, or validation errors
    /// unchanged.
    pub fn save(&mut self, article: &Article) -> RepoResult<Article> {
        self.repo.save(article)
    }

    /// Fetches an article, replaces its hashtag, and persists the change.
    ///
    /// # Contract
    /// - Only the hashtag and the modification audit pair change; creation
    ///   fields stay untouched.
    pub fn update_hashtag(
        &mut self,
        id: ArticleId,
        hashtag: Option<String>,
    ) -> RepoResult<Article> {
        let mut article = self.repo.find_by_id(id)?;
        article.hashtag = hashtag;
        self.repo.save(&article)
    }

    /// Deletes an article together with all of its comments.
    pub fn delete_article(&mut self, id: ArticleId) -> RepoResult<()> {
        self.repo.delete(id)
    }

    /// Total article count.
    pub fn count(&mut self) -> RepoResult<u64> {
        self.repo.count()
    }
}
