//! SeaORM visitor tracker tests
//!
//! Exercises the database-backed check-and-record against a real SQLite
//! database with migrations applied: the unique index on
//! (link_id, fingerprint) is what makes concurrent first scans safe.

use std::sync::Arc;

use chrono::Utc;
use tempfile::TempDir;

use qrlinker::storage::{connect_sqlite, run_migrations};
use qrlinker::visitor::{SeaOrmVisitorTracker, VisitorClass, VisitorTracker};

// =============================================================================
// Test Setup
// =============================================================================

async fn tracker_on_temp_db() -> (TempDir, SeaOrmVisitorTracker) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("visitor_test.db");
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

    let db = connect_sqlite(&db_url)
        .await
        .expect("Failed to connect to SQLite");
    run_migrations(&db).await.expect("Failed to run migrations");

    (temp_dir, SeaOrmVisitorTracker::new(db))
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn test_first_then_returning() {
    let (_dir, tracker) = tracker_on_temp_db().await;
    let now = Utc::now();

    assert_eq!(
        tracker.check_and_record("link-1", "fp-1", now).await.unwrap(),
        VisitorClass::First
    );
    assert_eq!(
        tracker.check_and_record("link-1", "fp-1", now).await.unwrap(),
        VisitorClass::Returning
    );
    assert_eq!(
        tracker.check_and_record("link-1", "fp-2", now).await.unwrap(),
        VisitorClass::First
    );
    assert_eq!(
        tracker.check_and_record("link-2", "fp-1", now).await.unwrap(),
        VisitorClass::First
    );
}

#[tokio::test]
async fn test_concurrent_scans_single_first() {
    let (_dir, tracker) = tracker_on_temp_db().await;
    let tracker = Arc::new(tracker);
    let now = Utc::now();

    let mut handles = Vec::new();
    for _ in 0..16 {
        let tracker = tracker.clone();
        handles.push(tokio::spawn(async move {
            tracker
                .check_and_record("link-1", "same-fp", now)
                .await
                .unwrap()
        }));
    }

    let mut first_count = 0;
    for handle in handles {
        if handle.await.unwrap() == VisitorClass::First {
            first_count += 1;
        }
    }
    assert_eq!(first_count, 1);
}

#[tokio::test]
async fn test_purge_link_removes_only_that_link() {
    let (_dir, tracker) = tracker_on_temp_db().await;
    let now = Utc::now();

    tracker.check_and_record("link-1", "fp-a", now).await.unwrap();
    tracker.check_and_record("link-1", "fp-b", now).await.unwrap();
    tracker.check_and_record("link-2", "fp-a", now).await.unwrap();

    assert_eq!(tracker.purge_link("link-1").await.unwrap(), 2);

    // link-1 的指纹重新从零开始，link-2 不受影响
    assert_eq!(
        tracker.check_and_record("link-1", "fp-a", now).await.unwrap(),
        VisitorClass::First
    );
    assert_eq!(
        tracker.check_and_record("link-2", "fp-a", now).await.unwrap(),
        VisitorClass::Returning
    );
}

#[tokio::test]
async fn test_backend_name() {
    let (_dir, tracker) = tracker_on_temp_db().await;
    assert_eq!(tracker.backend_name(), "sea-orm");
}
