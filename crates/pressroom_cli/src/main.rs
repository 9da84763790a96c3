//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `pressroom_core` linkage.
//! - Exercise the storage bootstrap and repository path end to end.

use pressroom_core::db::migrations::latest_version;
use pressroom_core::db::open_db_in_memory;
use pressroom_core::{ArticleRepository, Auditor, SqliteArticleRepository};

fn main() {
    if let Err(err) = run() {
        eprintln!("pressroom_cli error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("pressroom_core version={}", pressroom_core::core_version());

    let mut conn = open_db_in_memory()?;
    let auditor = Auditor::system("cli-probe");
    let mut repo = SqliteArticleRepository::try_new(&mut conn, &auditor)?;
    let articles = repo.count()?;

    let summary = serde_json::json!({
        "schema_version": latest_version(),
        "articles": articles,
    });
    println!("storage probe={summary}");

    Ok(())
}
