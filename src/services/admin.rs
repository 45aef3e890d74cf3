//! Admin API HTTP 处理器
//!
//! 链接配置的 CRUD 与扫码历史查询，挂在可配置前缀（默认 /admin）下，
//! 由 Bearer token 中间件保护。响应统一用 `{code, data}` 信封。

use std::sync::Arc;

use actix_web::{HttpResponse, Responder, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::errors::QrlinkerError;
use crate::services::qrc_service::{CreateQrcRequest, QrcService, UpdateQrcRequest};
use crate::storage::SeaOrmStorage;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub data: T,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PaginatedResponse<T> {
    pub code: i32,
    pub data: T,
    pub pagination: PaginationInfo,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PaginationInfo {
    pub page: u64,
    pub page_size: u64,
    pub total: u64,
    pub total_pages: u64,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct GetQrcsQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct GetScansQuery {
    pub limit: Option<u64>,
}

/// 扫码日志响应条目
#[derive(Serialize, Clone, Debug)]
pub struct ScanLogEntry {
    pub slot_id: Option<String>,
    pub matched_rule: Option<String>,
    pub scanned_at: DateTime<Utc>,
    pub referrer: Option<String>,
    pub ip_address: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
}

#[derive(Serialize, Clone, Debug)]
pub struct ScanHistory {
    pub code: String,
    pub total: u64,
    pub recent: Vec<ScanLogEntry>,
}

pub struct AdminService {}

impl AdminService {
    pub async fn get_qrcs(
        query: web::Query<GetQrcsQuery>,
        service: web::Data<Arc<QrcService>>,
    ) -> impl Responder {
        let page = query.page.unwrap_or(1).max(1);
        let page_size = query.page_size.unwrap_or(20).clamp(1, 100);

        match service.list(page, page_size).await {
            Ok(result) => {
                let total_pages = result.total.div_ceil(page_size);
                HttpResponse::Ok().json(PaginatedResponse {
                    code: 0,
                    data: result.items,
                    pagination: PaginationInfo {
                        page,
                        page_size,
                        total: result.total,
                        total_pages,
                    },
                })
            }
            Err(e) => error_to_response(&e),
        }
    }

    pub async fn post_qrc(
        payload: web::Json<CreateQrcRequest>,
        service: web::Data<Arc<QrcService>>,
    ) -> impl Responder {
        match service.create(payload.into_inner()).await {
            Ok(link) => HttpResponse::Created().json(ApiResponse { code: 0, data: link }),
            Err(e) => error_to_response(&e),
        }
    }

    pub async fn get_qrc(
        path: web::Path<String>,
        service: web::Data<Arc<QrcService>>,
    ) -> impl Responder {
        match service.get(&path.into_inner()).await {
            Ok(link) => HttpResponse::Ok().json(ApiResponse { code: 0, data: link }),
            Err(e) => error_to_response(&e),
        }
    }

    pub async fn put_qrc(
        path: web::Path<String>,
        payload: web::Json<UpdateQrcRequest>,
        service: web::Data<Arc<QrcService>>,
    ) -> impl Responder {
        match service.update(&path.into_inner(), payload.into_inner()).await {
            Ok(link) => HttpResponse::Ok().json(ApiResponse { code: 0, data: link }),
            Err(e) => error_to_response(&e),
        }
    }

    pub async fn delete_qrc(
        path: web::Path<String>,
        service: web::Data<Arc<QrcService>>,
    ) -> impl Responder {
        let code = path.into_inner();
        match service.delete(&code).await {
            Ok(()) => HttpResponse::Ok().json(ApiResponse { code: 0, data: code }),
            Err(e) => error_to_response(&e),
        }
    }

    pub async fn get_qrc_scans(
        path: web::Path<String>,
        query: web::Query<GetScansQuery>,
        service: web::Data<Arc<QrcService>>,
        storage: web::Data<Arc<SeaOrmStorage>>,
    ) -> impl Responder {
        let code = path.into_inner();
        let limit = query.limit.unwrap_or(50).clamp(1, 500);

        // 先确认链接存在，再查日志
        if let Err(e) = service.get(&code).await {
            return error_to_response(&e);
        }

        let total = match storage.total_scans(&code).await {
            Ok(total) => total,
            Err(e) => return error_to_response(&e),
        };
        match storage.recent_scans(&code, limit).await {
            Ok(logs) => {
                let recent = logs
                    .into_iter()
                    .map(|log| ScanLogEntry {
                        slot_id: log.slot_id,
                        matched_rule: log.matched_rule,
                        scanned_at: log.scanned_at,
                        referrer: log.referrer,
                        ip_address: log.ip_address,
                        country: log.country,
                        city: log.city,
                    })
                    .collect();
                HttpResponse::Ok().json(ApiResponse {
                    code: 0,
                    data: ScanHistory {
                        code,
                        total,
                        recent,
                    },
                })
            }
            Err(e) => error_to_response(&e),
        }
    }
}

/// 错误到 HTTP 状态码的统一映射
fn error_to_response(err: &QrlinkerError) -> HttpResponse {
    let body = serde_json::json!({
        "code": 1,
        "data": {
            "error": err.message(),
            "error_code": err.code(),
        }
    });

    match err {
        QrlinkerError::Validation(_) => HttpResponse::BadRequest().json(body),
        QrlinkerError::NotFound(_) => HttpResponse::NotFound().json(body),
        QrlinkerError::LinkConfiguration(_) => HttpResponse::UnprocessableEntity().json(body),
        e if e.is_transient() => HttpResponse::ServiceUnavailable().json(body),
        e => {
            error!("Admin API internal error: {}", e.format_simple());
            HttpResponse::InternalServerError().json(body)
        }
    }
}

pub fn admin_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/qrc", web::get().to(AdminService::get_qrcs))
        .route("/qrc", web::post().to(AdminService::post_qrc))
        .route("/qrc/{code}", web::get().to(AdminService::get_qrc))
        .route("/qrc/{code}", web::put().to(AdminService::put_qrc))
        .route("/qrc/{code}", web::delete().to(AdminService::delete_qrc))
        .route("/qrc/{code}/scans", web::get().to(AdminService::get_qrc_scans));
}
