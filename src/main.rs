use std::env;
use std::sync::Arc;
use std::time::Duration;

use actix_cors::Cors;
use actix_web::middleware::from_fn;
use actix_web::{App, HttpServer, web};
use dotenvy::dotenv;
use tracing::{debug, info};

use qrlinker::adaptive::Resolver;
use qrlinker::analytics::global::set_global_scan_manager;
use qrlinker::analytics::{DetailedScanSink, ScanManager, ScanSink};
use qrlinker::cache::{CacheFactory, ObjectCache};
use qrlinker::config::{get_config, init_config};
use qrlinker::middleware::{AuthMiddleware, HealthMiddleware};
use qrlinker::services::{
    AppStartTime, GeoIpProvider, HealthService, QrcService, admin_routes, scan_routes,
};
use qrlinker::storage::StorageFactory;
use qrlinker::system::init_logging;
use qrlinker::visitor::{SeaOrmVisitorTracker, VisitorTracker};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // 记录程序启动时间
    let app_start_time = AppStartTime {
        start_datetime: chrono::Utc::now(),
    };

    dotenv().ok();
    init_config();
    let config = get_config();

    // 日志 guard 需要存活到进程结束
    let _log_guard = init_logging(&config.logging);

    // 存储后端（含迁移）
    let storage = StorageFactory::create()
        .await
        .expect("Failed to create storage backend");
    info!("Using storage backend: {}", storage.backend_type());

    // 链接配置缓存
    let cache: Arc<dyn ObjectCache> = CacheFactory::create();
    debug!("Link cache backend: {}", cache.backend_name());

    // 访客追踪与解析引擎
    let tracker: Arc<dyn VisitorTracker> =
        Arc::new(SeaOrmVisitorTracker::new(storage.get_db().clone()));
    let resolver = Arc::new(Resolver::new(tracker.clone()));

    // 扫码统计：缓冲 + 后台定时刷盘
    let mut scan_manager = ScanManager::new(
        storage.clone() as Arc<dyn ScanSink>,
        Duration::from_secs(config.analytics.flush_interval_secs),
    );
    if config.analytics.enable_detailed_logging {
        scan_manager =
            scan_manager.with_detailed_sink(storage.clone() as Arc<dyn DetailedScanSink>);
    }
    let scan_manager = Arc::new(scan_manager);
    set_global_scan_manager(scan_manager.clone());
    tokio::spawn({
        let manager = scan_manager.clone();
        async move { manager.start_background_task().await }
    });

    // GeoIP 扫码地理标注
    let geoip = Arc::new(GeoIpProvider::new(&config.analytics));
    info!("GeoIP provider: {}", geoip.provider_name());

    // 管理服务
    let qrc_service = Arc::new(QrcService::new(
        storage.clone(),
        cache.clone(),
        tracker.clone(),
    ));

    let admin_prefix = config.server.admin_prefix.clone();
    let health_prefix = config.server.health_prefix.clone();

    // 检查 Admin API 是否启用
    let admin_token = env::var("ADMIN_TOKEN").unwrap_or_default();
    if admin_token.is_empty() {
        info!("Admin API is disabled (ADMIN_TOKEN not set)");
    } else {
        info!("Admin API available at: {}", admin_prefix);
    }

    // 检查 Health API 是否启用
    let health_token = env::var("HEALTH_TOKEN").unwrap_or_default();
    if health_token.is_empty() {
        info!("Health API is disabled (HEALTH_TOKEN is empty)");
    } else {
        info!("Health API available at: {}", health_prefix);
    }

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    let cpu_count = config.server.cpu_count;
    info!("Starting server at http://{}", bind_address);

    // Start the HTTP server
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(storage.clone()))
            .app_data(web::Data::new(cache.clone()))
            .app_data(web::Data::new(resolver.clone()))
            .app_data(web::Data::new(geoip.clone()))
            .app_data(web::Data::new(qrc_service.clone()))
            .app_data(web::Data::new(app_start_time.clone()))
            .service(
                web::scope(&admin_prefix)
                    .wrap(from_fn(AuthMiddleware::admin_auth))
                    .wrap(Cors::permissive())
                    .configure(admin_routes),
            )
            .service(
                web::scope(&health_prefix)
                    .wrap(from_fn(HealthMiddleware::health_auth))
                    .route("", web::get().to(HealthService::health_check))
                    .route("", web::head().to(HealthService::health_check))
                    .route("/ready", web::get().to(HealthService::readiness_check))
                    .route("/ready", web::head().to(HealthService::readiness_check))
                    .route("/live", web::get().to(HealthService::liveness_check))
                    .route("/live", web::head().to(HealthService::liveness_check)),
            )
            .service(scan_routes())
    })
    .keep_alive(Duration::from_secs(30))
    .workers(cpu_count)
    .bind(bind_address)?
    .run()
    .await?;

    // 停机前把缓冲的扫码数据刷出去
    scan_manager.flush().await;

    Ok(())
}
