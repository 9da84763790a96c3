//! Article repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide the five data-access operations over `articles` storage.
//! - Invoke the audit interceptor on every save path before SQL mutations.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths must call `Article::validate()` before SQL mutations.
//! - Read paths must reject invalid persisted state instead of masking it.
//! - Creation audit columns are never part of an UPDATE statement.
//! - Deleting an article removes its comments in the same transaction.

use crate::auditing::{AuditError, Auditor};
use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::article::{Article, ArticleId, ArticleValidationError};
use crate::model::audit::AuditStamp;
use crate::model::comment::CommentValidationError;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

const ARTICLE_SELECT_SQL: &str = "SELECT
    id,
    title,
    content,
    hashtag,
    version,
    created_at,
    created_by,
    modified_at,
    modified_by
FROM articles";

const ARTICLE_COLUMNS: [&str; 9] = [
    "id",
    "title",
    "content",
    "hashtag",
    "version",
    "created_at",
    "created_by",
    "modified_at",
    "modified_by",
];

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error shared by article and comment persistence.
#[derive(Debug)]
pub enum RepoError {
    Article(ArticleValidationError),
    Comment(CommentValidationError),
    Audit(AuditError),
    Db(DbError),
    NotFound {
        entity: &'static str,
        id: i64,
    },
    /// Optimistic version check failed: the record changed since it was read.
    Conflict {
        entity: &'static str,
        id: i64,
        expected_version: i64,
        actual_version: i64,
    },
    /// Dependent-comment removal failed; the whole delete rolled back.
    Cascade {
        article_id: ArticleId,
        source: DbError,
    },
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Article(err) => write!(f, "{err}"),
            Self::Comment(err) => write!(f, "{err}"),
            Self::Audit(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Conflict {
                entity,
                id,
                expected_version,
                actual_version,
            } => write!(
                f,
                "stale {entity} {id}: expected version {expected_version}, found {actual_version}"
            ),
            Self::Cascade { article_id, source } => {
                write!(f, "comment cascade failed for article {article_id}: {source}")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection has schema version {actual_version}, expected {expected_version}; \
                 open it through db::open_db"
            ),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "missing required column `{column}` in table `{table}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Article(err) => Some(err),
            Self::Comment(err) => Some(err),
            Self::Audit(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Cascade { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ArticleValidationError> for RepoError {
    fn from(value: ArticleValidationError) -> Self {
        Self::Article(value)
    }
}

impl From<CommentValidationError> for RepoError {
    fn from(value: CommentValidationError) -> Self {
        Self::Comment(value)
    }
}

impl From<AuditError> for RepoError {
    fn from(value: AuditError) -> Self {
        Self::Audit(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::from(value))
    }
}

/// Pagination options for list queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageQuery {
    /// Maximum rows to return; unlimited when `None`.
    pub limit: Option<u32>,
    /// Number of rows to skip.
    pub offset: u32,
}

/// Repository interface for article persistence.
pub trait ArticleRepository {
    /// Lists articles in stable `id` order, optionally paged.
    ///
    /// Statements execute eagerly on the repository's connection, so a
    /// caller always observes its own prior writes here.
    fn find_all(&mut self, page: &PageQuery) -> RepoResult<Vec<Article>>;

    /// Gets one article by id; absent ids are a `NotFound` error, never a
    /// silent default.
    fn find_by_id(&mut self, id: ArticleId) -> RepoResult<Article>;

    /// Upserts: inserts when `id` is unassigned, updates otherwise.
    ///
    /// The audit interceptor stamps the record before any SQL mutation;
    /// client-supplied stamps are ignored. Updates check the optimistic
    /// `version` and bump it. Returns the persisted article.
    fn save(&mut self, article: &Article) -> RepoResult<Article>;

    /// Removes the article and all its comments in one transaction.
    fn delete(&mut self, id: ArticleId) -> RepoResult<()>;

    /// Total article count, consistent with the latest committed writes.
    fn count(&mut self) -> RepoResult<u64>;
}

/// SQLite-backed article repository.
pub struct SqliteArticleRepository<'a> {
    conn: &'a mut Connection,
    auditor: &'a Auditor,
}

impl<'a> SqliteArticleRepository<'a> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'a mut Connection, auditor: &'a Auditor) -> RepoResult<Self> {
        ensure_schema_ready(conn, "articles", &ARTICLE_COLUMNS)?;
        Ok(Self { conn, auditor })
    }

    fn insert(&mut self, article: &Article) -> RepoResult<Article> {
        let stamp = self.auditor.stamp(None)?;

        self.conn.execute(
            "INSERT INTO articles (
                title,
                content,
                hashtag,
                version,
                created_at,
                created_by,
                modified_at,
                modified_by
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                article.title.as_str(),
                article.content.as_str(),
                article.hashtag.as_deref(),
                0i64,
                stamp.created_at,
                stamp.created_by.as_str(),
                stamp.modified_at,
                stamp.modified_by.as_str(),
            ],
        )?;

        Ok(Article {
            id: Some(self.conn.last_insert_rowid()),
            title: article.title.clone(),
            content: article.content.clone(),
            hashtag: article.hashtag.clone(),
            version: 0,
            audit: Some(stamp),
        })
    }

    fn update(&mut self, article: &Article, id: ArticleId) -> RepoResult<Article> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing = fetch_article_in_tx(&tx, id)?.ok_or(RepoError::NotFound {
            entity: "article",
            id,
        })?;
        if existing.version != article.version {
            return Err(RepoError::Conflict {
                entity: "article",
                id,
                expected_version: article.version,
                actual_version: existing.version,
            });
        }

        let prior_stamp = existing.audit.as_ref().ok_or_else(|| {
            RepoError::InvalidData(format!("article {id} is missing its audit stamp"))
        })?;
        let stamp = self.auditor.stamp(Some(prior_stamp))?;
        let next_version = existing.version + 1;

        tx.execute(
            "UPDATE articles
             SET
                title = ?1,
                content = ?2,
                hashtag = ?3,
                version = ?4,
                modified_at = ?5,
                modified_by = ?6
             WHERE id = ?7 AND version = ?8;",
            params![
                article.title.as_str(),
                article.content.as_str(),
                article.hashtag.as_deref(),
                next_version,
                stamp.modified_at,
                stamp.modified_by.as_str(),
                id,
                existing.version,
            ],
        )?;
        tx.commit()?;

        Ok(Article {
            id: Some(id),
            title: article.title.clone(),
            content: article.content.clone(),
            hashtag: article.hashtag.clone(),
            version: next_version,
            audit: Some(stamp),
        })
    }
}

impl ArticleRepository for SqliteArticleRepository<'_> {
    fn find_all(&mut self, page: &PageQuery) -> RepoResult<Vec<Article>> {
        let mut sql = format!("{ARTICLE_SELECT_SQL} ORDER BY id ASC");
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
        let mut articles = Vec::new();

        while let Some(row) = rows.next()? {
            articles.push(parse_article_row(row)?);
        }

        Ok(articles)
    }

    fn find_by_id(&mut self, id: ArticleId) -> RepoResult<Article> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ARTICLE_SELECT_SQL} WHERE id = ?1;"))?;

        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => parse_article_row(row),
            None => Err(RepoError::NotFound {
                entity: "article",
                id,
            }),
        }
    }

    fn save(&mut self, article: &Article) -> RepoResult<Article> {
        article.validate()?;

        match article.id {
            None => self.insert(article),
            Some(id) => self.update(article, id),
        }
    }

    fn delete(&mut self, id: ArticleId) -> RepoResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        if !article_exists_in_tx(&tx, id)? {
            return Err(RepoError::NotFound {
                entity: "article",
                id,
            });
        }

        if let Err(err) = tx.execute("DELETE FROM article_comments WHERE article_id = ?1;", [id]) {
            return Err(RepoError::Cascade {
                article_id: id,
                source: err.into(),
            });
        }

        tx.execute("DELETE FROM articles WHERE id = ?1;", [id])?;
        tx.commit()?;

        Ok(())
    }

    fn count(&mut self) -> RepoResult<u64> {
        let total: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM articles;", [], |row| row.get(0))?;
        Ok(total as u64)
    }
}

fn parse_article_row(row: &Row<'_>) -> RepoResult<Article> {
    let article = Article {
        id: Some(row.get("id")?),
        title: row.get("title")?,
        content: row.get("content")?,
        hashtag: row.get("hashtag")?,
        version: row.get("version")?,
        audit: Some(parse_audit_columns(row)?),
    };
    article.validate()?;
    Ok(article)
}

/// Reads the shared audit column set from a row of either entity table.
pub(crate) fn parse_audit_columns(row: &Row<'_>) -> RepoResult<AuditStamp> {
    Ok(AuditStamp {
        created_at: row.get("created_at")?,
        created_by: row.get("created_by")?,
        modified_at: row.get("modified_at")?,
        modified_by: row.get("modified_by")?,
    })
}

fn fetch_article_in_tx(tx: &Transaction<'_>, id: ArticleId) -> RepoResult<Option<Article>> {
    let mut stmt = tx.prepare(&format!("{ARTICLE_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id])?;
    match rows.next()? {
        Some(row) => Ok(Some(parse_article_row(row)?)),
        None => Ok(None),
    }
}

pub(crate) fn article_exists_in_tx(tx: &Transaction<'_>, id: ArticleId) -> RepoResult<bool> {
    let exists: i64 = tx.query_row(
        "SELECT EXISTS(SELECT 1 FROM articles WHERE id = ?1);",
        [id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

/// Validates that the connection carries the migrated schema this repository
/// layer expects.
pub(crate) fn ensure_schema_ready(
    conn: &Connection,
    table: &'static str,
    columns: &[&'static str],
) -> RepoResult<()> {
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let expected_version = latest_version();
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, table)? {
        return Err(RepoError::MissingRequiredTable(table));
    }

    for &column in columns {
        if !table_has_column(conn, table, column)? {
            return Err(RepoError::MissingRequiredColumn { table, column });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
