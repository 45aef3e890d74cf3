//! Admin API tests
//!
//! Bearer-token auth and the management CRUD surface over HTTP,
//! backed by a real SQLite database.

use std::sync::Arc;
use std::sync::Once;

use actix_web::http::StatusCode;
use actix_web::middleware::from_fn;
use actix_web::test::{self, TestRequest};
use actix_web::{App, web};
use serde_json::json;
use tempfile::TempDir;

use qrlinker::cache::NullObjectCache;
use qrlinker::config::init_config;
use qrlinker::middleware::{AuthMiddleware, HealthMiddleware};
use qrlinker::services::{AppStartTime, HealthService, QrcService, admin_routes};
use qrlinker::storage::{SeaOrmStorage, connect_sqlite, run_migrations};
use qrlinker::visitor::{SeaOrmVisitorTracker, VisitorTracker};

const TEST_TOKEN: &str = "admin-test-token";

// =============================================================================
// Test Setup
// =============================================================================

static INIT: Once = Once::new();
static TEST_DIR: std::sync::OnceLock<TempDir> = std::sync::OnceLock::new();
static STORAGE: std::sync::OnceLock<Arc<SeaOrmStorage>> = std::sync::OnceLock::new();
static RT_INIT: tokio::sync::OnceCell<()> = tokio::sync::OnceCell::const_new();

fn init_static_config() {
    INIT.call_once(|| {
        init_config();
        // Admin 开启、Health 保持禁用（HEALTH_TOKEN 未设置）
        unsafe {
            std::env::set_var("ADMIN_TOKEN", TEST_TOKEN);
        }
    });
}

async fn init_test_env() {
    init_static_config();

    RT_INIT
        .get_or_init(|| async {
            let temp_dir = TempDir::new().expect("Failed to create temp dir");
            let db_path = temp_dir.path().join("admin_api_test.db");
            let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

            let db = connect_sqlite(&db_url)
                .await
                .expect("Failed to connect to SQLite");
            run_migrations(&db).await.expect("Failed to run migrations");

            let _ = STORAGE.set(Arc::new(SeaOrmStorage::from_connection(db, "sqlite")));
            let _ = TEST_DIR.set(temp_dir);
        })
        .await;
}

macro_rules! admin_app {
    () => {{
        init_test_env().await;
        let storage = STORAGE.get().expect("Storage not initialized").clone();
        let tracker: Arc<dyn VisitorTracker> =
            Arc::new(SeaOrmVisitorTracker::new(storage.get_db().clone()));
        let service = Arc::new(QrcService::new(
            storage.clone(),
            Arc::new(NullObjectCache),
            tracker,
        ));
        let app_start_time = AppStartTime {
            start_datetime: chrono::Utc::now(),
        };
        test::init_service(
            App::new()
                .app_data(web::Data::new(storage.clone()))
                .app_data(web::Data::new(service))
                .app_data(web::Data::new(app_start_time))
                .service(
                    web::scope("/admin")
                        .wrap(from_fn(AuthMiddleware::admin_auth))
                        .configure(admin_routes),
                )
                .service(
                    web::scope("/health")
                        .wrap(from_fn(HealthMiddleware::health_auth))
                        .route("", web::get().to(HealthService::health_check)),
                ),
        )
        .await
    }};
}

fn authed(req: TestRequest) -> TestRequest {
    req.insert_header(("Authorization", format!("Bearer {}", TEST_TOKEN)))
}

fn create_payload(code: &str) -> serde_json::Value {
    json!({
        "code": code,
        "slots": [
            {"id": "A", "name": "default", "content": "https://a.example"},
            {"id": "B", "name": "lunch", "content": "https://b.example"}
        ],
        "date_rules": [
            {"slot": "B", "days": ["Mon"], "start_time": "11:00", "end_time": "14:00"}
        ],
        "default_slot": "A",
        "timezone": "America/New_York",
        "scan_limit": 500
    })
}

// =============================================================================
// Auth
// =============================================================================

#[actix_rt::test]
async fn test_missing_token_is_unauthorized() {
    let app = admin_app!();
    let resp = TestRequest::get().uri("/admin/qrc").send_request(&app).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn test_wrong_token_is_unauthorized() {
    let app = admin_app!();
    let resp = TestRequest::get()
        .uri("/admin/qrc")
        .insert_header(("Authorization", "Bearer wrong-token"))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn test_health_disabled_without_token_env() {
    let app = admin_app!();
    let resp = TestRequest::get().uri("/health").send_request(&app).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// CRUD
// =============================================================================

#[actix_rt::test]
async fn test_create_get_update_delete_flow() {
    let app = admin_app!();

    // Create
    let resp = authed(TestRequest::post().uri("/admin/qrc"))
        .set_json(create_payload("crud-demo"))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 0);
    assert_eq!(body["data"]["code"], "crud-demo");
    assert_eq!(body["data"]["timezone"], "America/New_York");

    // Get
    let resp = authed(TestRequest::get().uri("/admin/qrc/crud-demo"))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["slots"].as_array().unwrap().len(), 2);

    // Update：去掉槽 B，引用它的规则应被级联清理
    let resp = authed(TestRequest::put().uri("/admin/qrc/crud-demo"))
        .set_json(json!({
            "slots": [{"id": "A", "name": "default", "content": "https://a.example"}],
            "date_rules": [],
            "default_slot": "A"
        }))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["date_rules"].as_array().unwrap().len(), 0);

    // Scan history（空）
    let resp = authed(TestRequest::get().uri("/admin/qrc/crud-demo/scans"))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["total"], 0);

    // Delete
    let resp = authed(TestRequest::delete().uri("/admin/qrc/crud-demo"))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = authed(TestRequest::get().uri("/admin/qrc/crud-demo"))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_list_returns_pagination_envelope() {
    let app = admin_app!();

    let resp = authed(TestRequest::post().uri("/admin/qrc"))
        .set_json(create_payload("list-demo"))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = authed(TestRequest::get().uri("/admin/qrc?page=1&page_size=10"))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert!(body["pagination"]["total"].as_u64().unwrap() >= 1);
    assert_eq!(body["pagination"]["page"], 1);
}

#[actix_rt::test]
async fn test_validation_errors_are_bad_request() {
    let app = admin_app!();

    // 日期规则与首扫/回访规则互斥
    let resp = authed(TestRequest::post().uri("/admin/qrc"))
        .set_json(json!({
            "code": "invalid-demo",
            "slots": [
                {"id": "A", "content": "https://a.example"},
                {"id": "B", "content": "https://b.example"}
            ],
            "date_rules": [{"slot": "B"}],
            "first_return": {"enabled": true, "first_slot": "A", "return_slot": "B"}
        }))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["error_code"], "E006");
}

#[actix_rt::test]
async fn test_unknown_link_scans_is_not_found() {
    let app = admin_app!();
    let resp = authed(TestRequest::get().uri("/admin/qrc/ghost/scans"))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
