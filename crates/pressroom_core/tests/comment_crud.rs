use pressroom_core::db::open_db_in_memory;
use pressroom_core::{
    Article, ArticleComment, ArticleRepository, ArticleService, Auditor, CommentRepository,
    CommentService, CommentValidationError, ComposeArticleRequest, PageQuery, RepoError,
    SqliteArticleRepository, SqliteCommentRepository,
};

#[test]
fn add_and_list_comments_for_one_article() {
    let mut conn = open_db_in_memory().unwrap();
    let auditor = Auditor::system("tester");

    let article_id = seed_article(&mut conn, &auditor);

    let mut repo = SqliteCommentRepository::try_new(&mut conn, &auditor).unwrap();
    let first = repo
        .save(&ArticleComment::new(article_id, "first reply"))
        .unwrap();
    let second = repo
        .save(&ArticleComment::new(article_id, "second reply"))
        .unwrap();

    let listed = repo.find_by_article(article_id).unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, first.id);
    assert_eq!(listed[1].id, second.id);
    assert!(listed.iter().all(|comment| comment.article_id == article_id));

    let paged = repo
        .find_all(&PageQuery {
            limit: Some(1),
            offset: 1,
        })
        .unwrap();
    assert_eq!(paged.len(), 1);
    assert_eq!(paged[0].id, second.id);

    let stamp = first.audit.unwrap();
    assert_eq!(stamp.created_by, "tester");
    assert_eq!(stamp.created_at, stamp.modified_at);
}

#[test]
fn comment_for_missing_article_is_not_found() {
    let mut conn = open_db_in_memory().unwrap();
    let auditor = Auditor::system("tester");
    let mut repo = SqliteCommentRepository::try_new(&mut conn, &auditor).unwrap();

    let err = repo
        .save(&ArticleComment::new(99, "reply to nothing"))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::NotFound {
            entity: "article",
            id: 99
        }
    ));
    assert_eq!(repo.count().unwrap(), 0);
}

#[test]
fn update_comment_bumps_version_and_restamps_modified_pair() {
    let mut conn = open_db_in_memory().unwrap();
    let auditor = Auditor::system("tester");

    let article_id = seed_article(&mut conn, &auditor);

    let mut repo = SqliteCommentRepository::try_new(&mut conn, &auditor).unwrap();
    let created = repo
        .save(&ArticleComment::new(article_id, "draft reply"))
        .unwrap();
    let created_stamp = created.audit.clone().unwrap();

    let mut edited = created.clone();
    edited.content = "edited reply".to_string();
    let saved = repo.save(&edited).unwrap();

    assert_eq!(saved.version, 1);
    assert_eq!(saved.content, "edited reply");

    let reloaded = repo.find_by_id(saved.id.unwrap()).unwrap();
    let stamp = reloaded.audit.unwrap();
    assert_eq!(stamp.created_at, created_stamp.created_at);
    assert!(stamp.modified_at >= created_stamp.modified_at);
}

#[test]
fn stale_comment_version_is_a_conflict() {
    let mut conn = open_db_in_memory().unwrap();
    let auditor = Auditor::system("tester");

    let article_id = seed_article(&mut conn, &auditor);

    let mut repo = SqliteCommentRepository::try_new(&mut conn, &auditor).unwrap();
    let created = repo
        .save(&ArticleComment::new(article_id, "contested reply"))
        .unwrap();

    let mut winner = created.clone();
    winner.content = "first write".to_string();
    repo.save(&winner).unwrap();

    let mut loser = created;
    loser.content = "second write".to_string();
    let err = repo.save(&loser).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Conflict {
            entity: "comment",
            expected_version: 0,
            actual_version: 1,
            ..
        }
    ));
}

#[test]
fn delete_comment_removes_single_row() {
    let mut conn = open_db_in_memory().unwrap();
    let auditor = Auditor::system("tester");

    let article_id = seed_article(&mut conn, &auditor);

    let mut repo = SqliteCommentRepository::try_new(&mut conn, &auditor).unwrap();
    let kept = repo
        .save(&ArticleComment::new(article_id, "kept reply"))
        .unwrap();
    let removed = repo
        .save(&ArticleComment::new(article_id, "removed reply"))
        .unwrap();
    let removed_id = removed.id.unwrap();

    repo.delete(removed_id).unwrap();
    assert_eq!(repo.count().unwrap(), 1);

    let err = repo.delete(removed_id).unwrap_err();
    assert!(matches!(
        err,
        RepoError::NotFound {
            entity: "comment",
            ..
        }
    ));

    assert_eq!(repo.find_by_id(kept.id.unwrap()).unwrap().content, "kept reply");
}

#[test]
fn empty_comment_content_is_rejected() {
    let mut conn = open_db_in_memory().unwrap();
    let auditor = Auditor::system("tester");

    let article_id = seed_article(&mut conn, &auditor);

    let mut repo = SqliteCommentRepository::try_new(&mut conn, &auditor).unwrap();
    let err = repo
        .save(&ArticleComment::new(article_id, "   "))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Comment(CommentValidationError::EmptyContent)
    ));
}

#[test]
fn services_cover_the_compose_and_reply_flow() {
    let mut conn = open_db_in_memory().unwrap();
    let auditor = Auditor::system("tester");

    let article_id = {
        let repo = SqliteArticleRepository::try_new(&mut conn, &auditor).unwrap();
        let mut service = ArticleService::new(repo);
        let composed = service
            .compose(&ComposeArticleRequest {
                title: "service flow".to_string(),
                content: "body".to_string(),
                hashtag: Some("#service".to_string()),
            })
            .unwrap();
        assert_eq!(service.count().unwrap(), 1);
        composed.id.unwrap()
    };

    {
        let repo = SqliteCommentRepository::try_new(&mut conn, &auditor).unwrap();
        let mut service = CommentService::new(repo);
        service.add_comment(article_id, "first reply").unwrap();
        assert_eq!(service.comments_for(article_id).unwrap().len(), 1);
    }

    let repo = SqliteArticleRepository::try_new(&mut conn, &auditor).unwrap();
    let mut service = ArticleService::new(repo);
    let updated = service
        .update_hashtag(article_id, Some("#abcd".to_string()))
        .unwrap();
    assert_eq!(updated.hashtag.as_deref(), Some("#abcd"));

    service.delete_article(article_id).unwrap();
    assert_eq!(service.count().unwrap(), 0);
}

fn seed_article(conn: &mut rusqlite::Connection, auditor: &Auditor) -> i64 {
    let mut repo = SqliteArticleRepository::try_new(conn, auditor).unwrap();
    repo.save(&Article::new("parent", "body", None))
        .unwrap()
        .id
        .unwrap()
}
