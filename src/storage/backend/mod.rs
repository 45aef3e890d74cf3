//! SeaORM storage backend
//!
//! This module provides database storage using SeaORM,
//! supporting SQLite, MySQL/MariaDB, and PostgreSQL.

mod connection;
mod converters;
mod operations;
mod scan_sink;

use sea_orm::DatabaseConnection;

use crate::errors::{QrlinkerError, Result};

pub use connection::{connect_generic, connect_sqlite, run_migrations};
pub use converters::{model_to_qrc, qrc_to_active_model};
pub use operations::QrcPage;

/// 从数据库 URL 推断数据库类型
pub fn infer_backend_from_url(database_url: &str) -> Result<String> {
    if database_url.starts_with("sqlite://")
        || database_url.ends_with(".db")
        || database_url.ends_with(".sqlite")
        || database_url == ":memory:"
    {
        Ok("sqlite".to_string())
    } else if database_url.starts_with("mysql://") || database_url.starts_with("mariadb://") {
        Ok("mysql".to_string())
    } else if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        Ok("postgres".to_string())
    } else {
        Err(QrlinkerError::database_config(format!(
            "无法从 URL 推断数据库类型: {}. 支持的 URL 格式: sqlite://, mysql://, mariadb://, postgres://",
            database_url
        )))
    }
}

/// SeaORM 存储后端
pub struct SeaOrmStorage {
    db: DatabaseConnection,
    backend_type: String,
}

impl SeaOrmStorage {
    /// 连接数据库并运行迁移
    pub async fn new(database_url: &str, backend_type: &str) -> Result<Self> {
        let db = match backend_type {
            "sqlite" => connect_sqlite(database_url).await?,
            other => connect_generic(database_url, other).await?,
        };

        run_migrations(&db).await?;

        Ok(Self {
            db,
            backend_type: backend_type.to_string(),
        })
    }

    /// 包装已有连接（测试用）
    pub fn from_connection(db: DatabaseConnection, backend_type: &str) -> Self {
        Self {
            db,
            backend_type: backend_type.to_string(),
        }
    }

    pub fn get_db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn backend_type(&self) -> &str {
        &self.backend_type
    }
}
