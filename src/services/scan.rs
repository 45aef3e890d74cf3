//! 扫码解析服务
//!
//! 扫码请求的完整路径：短码 → 链接配置（缓存/存储）→ 配额检查 →
//! 指纹 → Adaptive 解析 → 跳转或渲染。统计走缓冲异步刷盘，不阻塞响应。

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, Responder, web};
use chrono::Utc;
use tracing::{debug, error, warn};

use crate::adaptive::{AdaptiveQrc, Resolution, Resolver};
use crate::analytics::ScanDetail;
use crate::analytics::global::get_scan_manager;
use crate::cache::{CacheResult, ObjectCache};
use crate::config::get_config;
use crate::errors::QrlinkerError;
use crate::services::geoip::GeoIpProvider;
use crate::storage::SeaOrmStorage;
use crate::utils::ip::extract_client_ip;
use crate::utils::{is_valid_short_code, visitor_fingerprint};

pub struct ScanService {}

impl ScanService {
    pub async fn handle_scan(
        req: HttpRequest,
        path: web::Path<String>,
        cache: web::Data<Arc<dyn ObjectCache>>,
        storage: web::Data<Arc<SeaOrmStorage>>,
        resolver: web::Data<Arc<Resolver>>,
        geoip: Option<web::Data<Arc<GeoIpProvider>>>,
    ) -> impl Responder {
        let captured_path = path.into_inner();

        if captured_path.is_empty() {
            let fallback = get_config().resolver.fallback_url.clone();
            return HttpResponse::TemporaryRedirect()
                .insert_header(("Location", fallback))
                .finish();
        }

        if !is_valid_short_code(&captured_path) {
            // 非法短码，直接 404（不进缓存）
            return Self::not_found_response();
        }

        Self::process_scan(captured_path, req, cache, storage, resolver, geoip).await
    }

    async fn process_scan(
        code: String,
        req: HttpRequest,
        cache: web::Data<Arc<dyn ObjectCache>>,
        storage: web::Data<Arc<SeaOrmStorage>>,
        resolver: web::Data<Arc<Resolver>>,
        geoip: Option<web::Data<Arc<GeoIpProvider>>>,
    ) -> HttpResponse {
        match cache.get(&code).await {
            CacheResult::Found(link) => Self::serve(&link, &req, resolver, geoip).await,
            CacheResult::Miss => {
                debug!("Cache miss for code: {}", code);
                match storage.get_by_code(&code).await {
                    Ok(Some(link)) => {
                        let link = Arc::new(link);
                        cache.insert(&code, link.clone()).await;
                        Self::serve(&link, &req, resolver, geoip).await
                    }
                    Ok(None) => {
                        debug!("Adaptive QRC not found in database: {}", code);
                        cache.mark_not_found(&code).await;
                        Self::not_found_response()
                    }
                    Err(e) => {
                        error!("Database error during scan lookup: {}", e);
                        Self::error_response()
                    }
                }
            }
            CacheResult::NotFound => {
                debug!("Negative cache hit for code: {}", code);
                Self::not_found_response()
            }
        }
    }

    async fn serve(
        link: &AdaptiveQrc,
        req: &HttpRequest,
        resolver: web::Data<Arc<Resolver>>,
        geoip: Option<web::Data<Arc<GeoIpProvider>>>,
    ) -> HttpResponse {
        // 配额在解析之外检查：超限的扫码既不解析也不计数
        if link.is_over_quota() {
            debug!("Link {} over scan quota ({})", link.code, link.scan_limit);
            return HttpResponse::build(StatusCode::GONE)
                .insert_header(("Content-Type", "text/html; charset=utf-8"))
                .insert_header(("Cache-Control", "public, max-age=60"))
                .body("Scan limit reached");
        }

        let ip = extract_client_ip(req);
        let user_agent = req
            .headers()
            .get("user-agent")
            .and_then(|h| h.to_str().ok())
            .map(String::from);
        let fingerprint = visitor_fingerprint(ip.as_deref(), user_agent.as_deref());

        let resolution = match resolver
            .resolve(link, Utc::now(), link.timezone, &fingerprint)
            .await
        {
            Ok(resolution) => resolution,
            Err(QrlinkerError::LinkConfiguration(msg)) => {
                warn!("Unservable link {}: {}", link.code, msg);
                return Self::unavailable_response();
            }
            Err(e) if e.is_transient() => {
                if get_config().resolver.degrade_to_default {
                    // 显式配置的降级路径：跳过访客记录，直接服务兜底槽
                    warn!(
                        "Visitor tracker unavailable for link {}, degrading to default slot: {}",
                        link.code, e
                    );
                    match Resolver::default_resolution(link) {
                        Ok(resolution) => resolution,
                        Err(_) => return Self::unavailable_response(),
                    }
                } else {
                    warn!("Visitor tracker unavailable for link {}: {}", link.code, e);
                    return HttpResponse::build(StatusCode::SERVICE_UNAVAILABLE)
                        .insert_header(("Content-Type", "text/html; charset=utf-8"))
                        .insert_header(("Retry-After", "1"))
                        .body("Temporarily Unavailable");
                }
            }
            Err(e) => {
                error!("Unexpected resolve error for link {}: {}", link.code, e);
                return Self::error_response();
            }
        };

        Self::record_scan(link, &resolution, req, ip, user_agent, geoip);
        Self::finish_response(resolution)
    }

    /// 更新扫码统计（异步处理分析逻辑，不阻塞响应）
    fn record_scan(
        link: &AdaptiveQrc,
        resolution: &Resolution,
        req: &HttpRequest,
        ip: Option<String>,
        user_agent: Option<String>,
        geoip: Option<web::Data<Arc<GeoIpProvider>>>,
    ) {
        let Some(manager) = get_scan_manager() else {
            return;
        };

        manager.increment(&link.code);

        if !manager.is_detailed_logging_enabled() {
            return;
        }

        let referrer = req
            .headers()
            .get("referer")
            .and_then(|h| h.to_str().ok())
            .map(String::from);

        let mut detail = ScanDetail::new(link.code.clone())
            .with_resolution(resolution.slot_id.clone(), resolution.matched.as_ref());
        detail.referrer = referrer;
        detail.user_agent = user_agent;
        detail.ip_address = ip.clone();

        let manager = Arc::clone(manager);
        // GeoIP 查询可能读磁盘，放到响应路径之外
        actix_web::rt::spawn(async move {
            if let (Some(geoip), Some(ip)) = (geoip, ip) {
                if let Some(geo) = geoip.lookup(&ip).await {
                    detail = detail.with_geo(geo.country, geo.city);
                }
            }
            manager.log_detail(detail);
        });
    }

    fn finish_response(resolution: Resolution) -> HttpResponse {
        // http(s) URL 跳转，其余内容（mailto、纯文本、vCard 等）原样渲染
        let is_http_url = url::Url::parse(&resolution.content)
            .map(|u| matches!(u.scheme(), "http" | "https"))
            .unwrap_or(false);

        if is_http_url {
            HttpResponse::build(StatusCode::TEMPORARY_REDIRECT)
                .insert_header(("Location", resolution.content))
                .finish()
        } else {
            HttpResponse::Ok()
                .insert_header(("Content-Type", "text/plain; charset=utf-8"))
                .body(resolution.content)
        }
    }

    #[inline]
    fn not_found_response() -> HttpResponse {
        HttpResponse::build(StatusCode::NOT_FOUND)
            .insert_header(("Content-Type", "text/html; charset=utf-8"))
            .insert_header(("Cache-Control", "public, max-age=60"))
            .body("Not Found")
    }

    #[inline]
    fn unavailable_response() -> HttpResponse {
        // 配置损坏的链接给通用不可用页，绝不猜测内容
        HttpResponse::build(StatusCode::NOT_FOUND)
            .insert_header(("Content-Type", "text/html; charset=utf-8"))
            .insert_header(("Cache-Control", "public, max-age=60"))
            .body("Content Unavailable")
    }

    #[inline]
    fn error_response() -> HttpResponse {
        HttpResponse::build(StatusCode::INTERNAL_SERVER_ERROR)
            .insert_header(("Content-Type", "text/html; charset=utf-8"))
            .body("Internal Server Error")
    }
}

/// 扫码路由配置（catch-all，注册在所有前缀路由之后）
pub fn scan_routes() -> actix_web::Scope {
    web::scope("")
        .route("/{path}*", web::get().to(ScanService::handle_scan))
        .route("/{path}*", web::head().to(ScanService::handle_scan))
}
