//! Service layer for business logic
//!
//! This module provides the HTTP handlers and the business logic
//! shared between them: scan resolution, link management, health.

mod admin;
pub mod geoip;
mod health;
mod qrc_service;
mod scan;

pub use admin::{AdminService, ApiResponse, PaginatedResponse, PaginationInfo, admin_routes};
pub use geoip::{GeoInfo, GeoIpLookup, GeoIpProvider};
pub use health::{AppStartTime, HealthService};
pub use qrc_service::{CreateQrcRequest, QrcService, UpdateQrcRequest};
pub use scan::{ScanService, scan_routes};
