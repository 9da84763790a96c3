//! Comment repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide the five data-access operations over `article_comments`.
//! - Enforce parent-article existence before a comment is inserted.
//!
//! # Invariants
//! - Write paths must call `ArticleComment::validate()` before SQL mutations.
//! - A comment is never inserted for an article id with no row.
//! - Creation audit columns are never part of an UPDATE statement.

use crate::auditing::Auditor;
use crate::model::article::ArticleId;
use crate::model::comment::{ArticleComment, CommentId};
use crate::repo::article_repo::{
    article_exists_in_tx, ensure_schema_ready, parse_audit_columns, PageQuery, RepoError,
    RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, TransactionBehavior};

const COMMENT_SELECT_SQL: &str = "SELECT
    id,
    article_id,
    content,
    version,
    created_at,
    created_by,
    modified_at,
    modified_by
FROM article_comments";

const COMMENT_COLUMNS: [&str; 8] = [
    "id",
    "article_id",
    "content",
    "version",
    "created_at",
    "created_by",
    "modified_at",
    "modified_by",
];

/// Repository interface for comment persistence.
pub trait CommentRepository {
    /// Lists comments in stable `id` order, optionally paged.
    fn find_all(&mut self, page: &PageQuery) -> RepoResult<Vec<ArticleComment>>;

    /// Gets one comment by id; absent ids are a `NotFound` error.
    fn find_by_id(&mut self, id: CommentId) -> RepoResult<ArticleComment>;

    /// Lists all comments owned by one article, oldest first.
    fn find_by_article(&mut self, article_id: ArticleId) -> RepoResult<Vec<ArticleComment>>;

    /// Upserts: inserts when `id` is unassigned, updates otherwise.
    ///
    /// Insert requires the parent article to exist. The audit interceptor
    /// stamps the record before any SQL mutation.
    fn save(&mut self, comment: &ArticleComment) -> RepoResult<ArticleComment>;

    /// Removes one comment.
    fn delete(&mut self, id: CommentId) -> RepoResult<()>;

    /// Total comment count, consistent with the latest committed writes.
    fn count(&mut self) -> RepoResult<u64>;
}

/// SQLite-backed comment repository.
pub struct SqliteCommentRepository<'a> {
    conn: &'a mut Connection,
    auditor: &'a Auditor,
}

impl<'a> SqliteCommentRepository<'a> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'a mut Connection, auditor: &'a Auditor) -> RepoResult<Self> {
        ensure_schema_ready(conn, "article_comments", &COMMENT_COLUMNS)?;
        Ok(Self { conn, auditor })
    }

    fn insert(&mut self, comment: &ArticleComment) -> RepoResult<ArticleComment> {
        let stamp = self.auditor.stamp(None)?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        if !article_exists_in_tx(&tx, comment.article_id)? {
            return Err(RepoError::NotFound {
                entity: "article",
                id: comment.article_id,
            });
        }

        tx.execute(
            "INSERT INTO article_comments (
                article_id,
                content,
                version,
                created_at,
                created_by,
                modified_at,
                modified_by
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                comment.article_id,
                comment.content.as_str(),
                0i64,
                stamp.created_at,
                stamp.created_by.as_str(),
                stamp.modified_at,
                stamp.modified_by.as_str(),
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(ArticleComment {
            id: Some(id),
            article_id: comment.article_id,
            content: comment.content.clone(),
            version: 0,
            audit: Some(stamp),
        })
    }

    fn update(&mut self, comment: &ArticleComment, id: CommentId) -> RepoResult<ArticleComment> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing = {
            let mut stmt = tx.prepare(&format!("{COMMENT_SELECT_SQL} WHERE id = ?1;"))?;
            let mut rows = stmt.query([id])?;
            match rows.next()? {
                Some(row) => parse_comment_row(row)?,
                None => {
                    return Err(RepoError::NotFound {
                        entity: "comment",
                        id,
                    })
                }
            }
        };

        if existing.version != comment.version {
            return Err(RepoError::Conflict {
                entity: "comment",
                id,
                expected_version: comment.version,
                actual_version: existing.version,
            });
        }

        let prior_stamp = existing.audit.as_ref().ok_or_else(|| {
            RepoError::InvalidData(format!("comment {id} is missing its audit stamp"))
        })?;
        let stamp = self.auditor.stamp(Some(prior_stamp))?;
        let next_version = existing.version + 1;

        tx.execute(
            "UPDATE article_comments
             SET
                content = ?1,
                version = ?2,
                modified_at = ?3,
                modified_by = ?4
             WHERE id = ?5 AND version = ?6;",
            params![
                comment.content.as_str(),
                next_version,
                stamp.modified_at,
                stamp.modified_by.as_str(),
                id,
                existing.version,
            ],
        )?;
        tx.commit()?;

        Ok(ArticleComment {
            id: Some(id),
            article_id: existing.article_id,
            content: comment.content.clone(),
            version: next_version,
            audit: Some(stamp),
        })
    }
}

impl CommentRepository for SqliteCommentRepository<'_> {
    fn find_all(&mut self, page: &PageQuery) -> RepoResult<Vec<ArticleComment>> {
        let mut sql = format!("{COMMENT_SELECT_SQL} ORDER BY id ASC");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(limit) = page.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if page.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(page.offset)));
            }
        } else if page.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(page.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut comments = Vec::new();

        while let Some(row) = rows.next()? {
            comments.push(parse_comment_row(row)?);
        }

        Ok(comments)
    }

    fn find_by_id(&mut self, id: CommentId) -> RepoResult<ArticleComment> {
        let mut stmt = self
            .conn
            .prepare(&format!("{COMMENT_SELECT_SQL} WHERE id = ?1;"))?;

        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => parse_comment_row(row),
            None => Err(RepoError::NotFound {
                entity: "comment",
                id,
            }),
        }
    }

    fn find_by_article(&mut self, article_id: ArticleId) -> RepoResult<Vec<ArticleComment>> {
        let mut stmt = self.conn.prepare(&format!(
            "{COMMENT_SELECT_SQL} WHERE article_id = ?1 ORDER BY id ASC;"
        ))?;

        let mut rows = stmt.query([article_id])?;
        let mut comments = Vec::new();
        while let Some(row) = rows.next()? {
            comments.push(parse_comment_row(row)?);
        }

        Ok(comments)
    }

    fn save(&mut self, comment: &ArticleComment) -> RepoResult<ArticleComment> {
        comment.validate()?;

        match comment.id {
            None => self.insert(comment),
            Some(id) => self.update(comment, id),
        }
    }

    fn delete(&mut self, id: CommentId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM article_comments WHERE id = ?1;", [id])?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "comment",
                id,
            });
        }

        Ok(())
    }

    fn count(&mut self) -> RepoResult<u64> {
        let total: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM article_comments;", [], |row| {
                    row.get(0)
                })?;
        Ok(total as u64)
    }
}

fn parse_comment_row(row: &Row<'_>) -> RepoResult<ArticleComment> {
    let comment = ArticleComment {
        id: Some(row.get("id")?),
        article_id: row.get("article_id")?,
        content: row.get("content")?,
        version: row.get("version")?,
        audit: Some(parse_audit_columns(row)?),
    };
    comment.validate()?;
    Ok(comment)
}
