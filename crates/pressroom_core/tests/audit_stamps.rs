use pressroom_core::db::open_db_in_memory;
use pressroom_core::{
    ActingPrincipal, Article, ArticleRepository, AuditClock, AuditError, Auditor, FixedPrincipal,
    RepoError, SqliteArticleRepository,
};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

struct StepClock(Arc<AtomicI64>);

impl AuditClock for StepClock {
    fn now_epoch_ms(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

struct NoPrincipal;

impl ActingPrincipal for NoPrincipal {
    fn current_principal(&self) -> Option<String> {
        None
    }
}

fn stepped_auditor(principal: &str, start_ms: i64) -> (Auditor, Arc<AtomicI64>) {
    let tick = Arc::new(AtomicI64::new(start_ms));
    let auditor = Auditor::new(
        Box::new(FixedPrincipal::new(principal)),
        Box::new(StepClock(Arc::clone(&tick))),
    );
    (auditor, tick)
}

#[test]
fn creation_stamps_all_fields_from_one_instant() {
    let mut conn = open_db_in_memory().unwrap();
    let (auditor, _tick) = stepped_auditor("editor", 1_000);
    let mut repo = SqliteArticleRepository::try_new(&mut conn, &auditor).unwrap();

    let saved = repo.save(&Article::new("fresh", "body", None)).unwrap();
    let stamp = saved.audit.unwrap();

    assert_eq!(stamp.created_at, 1_000);
    assert_eq!(stamp.modified_at, 1_000);
    assert_eq!(stamp.created_by, "editor");
    assert_eq!(stamp.modified_by, "editor");
}

#[test]
fn repeated_updates_keep_created_and_advance_modified() {
    let mut conn = open_db_in_memory().unwrap();
    let (auditor, tick) = stepped_auditor("editor", 1_000);
    let mut repo = SqliteArticleRepository::try_new(&mut conn, &auditor).unwrap();

    let id = repo
        .save(&Article::new("draft", "first body", None))
        .unwrap()
        .id
        .unwrap();

    tick.store(2_000, Ordering::SeqCst);
    let mut article = repo.find_by_id(id).unwrap();
    article.content = "second body".to_string();
    repo.save(&article).unwrap();

    tick.store(3_500, Ordering::SeqCst);
    let mut article = repo.find_by_id(id).unwrap();
    article.content = "third body".to_string();
    repo.save(&article).unwrap();

    let final_state = repo.find_by_id(id).unwrap();
    let stamp = final_state.audit.unwrap();
    assert_eq!(stamp.created_at, 1_000);
    assert_eq!(stamp.created_by, "editor");
    assert_eq!(stamp.modified_at, 3_500);
    assert_eq!(final_state.version, 2);
}

#[test]
fn update_attributes_modified_by_to_the_latest_principal() {
    let mut conn = open_db_in_memory().unwrap();

    let id = {
        let (author, _tick) = stepped_auditor("author", 1_000);
        let mut repo = SqliteArticleRepository::try_new(&mut conn, &author).unwrap();
        repo.save(&Article::new("handed over", "body", None))
            .unwrap()
            .id
            .unwrap()
    };

    let (moderator, _tick) = stepped_auditor("moderator", 2_000);
    let mut repo = SqliteArticleRepository::try_new(&mut conn, &moderator).unwrap();
    let mut article = repo.find_by_id(id).unwrap();
    article.hashtag = Some("#moderated".to_string());
    let saved = repo.save(&article).unwrap();

    let stamp = saved.audit.unwrap();
    assert_eq!(stamp.created_by, "author");
    assert_eq!(stamp.modified_by, "moderator");
    assert_eq!(stamp.modified_at, 2_000);
}

#[test]
fn missing_principal_blocks_write_and_persists_nothing() {
    let mut conn = open_db_in_memory().unwrap();
    let auditor = Auditor::new(Box::new(NoPrincipal), Box::new(StepClock(Arc::new(AtomicI64::new(1_000)))));
    let mut repo = SqliteArticleRepository::try_new(&mut conn, &auditor).unwrap();

    let err = repo.save(&Article::new("orphan", "body", None)).unwrap_err();
    assert!(matches!(err, RepoError::Audit(AuditError::MissingPrincipal)));
    assert_eq!(repo.count().unwrap(), 0);
}

#[test]
fn schema_rejects_rows_without_audit_fields() {
    let conn = open_db_in_memory().unwrap();

    let err = conn
        .execute(
            "INSERT INTO articles (
                title, content, version, created_at, created_by, modified_at, modified_by
            ) VALUES ('t', 'c', 0, NULL, 'x', 0, 'x');",
            [],
        )
        .unwrap_err();
    assert!(err.to_string().contains("NOT NULL"));

    let err = conn
        .execute(
            "INSERT INTO articles (
                title, content, version, created_at, created_by, modified_at, modified_by
            ) VALUES ('t', 'c', 0, 2000, 'x', 1000, 'x');",
            [],
        )
        .unwrap_err();
    assert!(err.to_string().contains("CHECK"));
}

#[test]
fn serialized_article_exposes_audit_metadata() {
    let mut conn = open_db_in_memory().unwrap();
    let (auditor, _tick) = stepped_auditor("editor", 1_000);
    let mut repo = SqliteArticleRepository::try_new(&mut conn, &auditor).unwrap();

    let saved = repo
        .save(&Article::new("wire shape", "body", Some("#tag".to_string())))
        .unwrap();

    let json = serde_json::to_value(&saved).unwrap();
    assert_eq!(json["title"], "wire shape");
    assert_eq!(json["audit"]["created_by"], "editor");
    assert_eq!(json["audit"]["modified_at"], 1_000);
}
