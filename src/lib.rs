//! Qrlinker - backend for the qrlinker QR-code product
//!
//! This library provides the core functionality for the Qrlinker service:
//! adaptive QR short links whose destination content is chosen per scan,
//! scan history with geo-tagging, and the admin management API.
//!
//! # Architecture
//! - `adaptive`: the Adaptive QRC resolution engine (slots, rules, resolver)
//! - `visitor`: first/return visitor state tracking with atomic check-and-record
//! - `analytics`: buffered scan counting and detailed scan logs
//! - `cache`: link configuration object cache (moka)
//! - `storage`: SeaORM storage backends and data access
//! - `services`: HTTP services (scan, admin, health) and GeoIP
//! - `middleware`: bearer-token auth for admin/health scopes
//! - `config`: configuration management
//! - `system`: logging initialization

pub mod adaptive;
pub mod analytics;
pub mod cache;
pub mod config;
pub mod errors;
pub mod middleware;
pub mod services;
pub mod storage;
pub mod system;
pub mod utils;
pub mod visitor;
