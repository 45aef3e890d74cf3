use std::fmt;

#[derive(Debug, Clone)]
pub enum QrlinkerError {
    DatabaseConfig(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    LinkConfiguration(String),
    TransientStorage(String),
    Validation(String),
    NotFound(String),
    Serialization(String),
    TimeParse(String),
    FileOperation(String),
}

impl QrlinkerError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            QrlinkerError::DatabaseConfig(_) => "E001",
            QrlinkerError::DatabaseConnection(_) => "E002",
            QrlinkerError::DatabaseOperation(_) => "E003",
            QrlinkerError::LinkConfiguration(_) => "E004",
            QrlinkerError::TransientStorage(_) => "E005",
            QrlinkerError::Validation(_) => "E006",
            QrlinkerError::NotFound(_) => "E007",
            QrlinkerError::Serialization(_) => "E008",
            QrlinkerError::TimeParse(_) => "E009",
            QrlinkerError::FileOperation(_) => "E010",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            QrlinkerError::DatabaseConfig(_) => "Database Configuration Error",
            QrlinkerError::DatabaseConnection(_) => "Database Connection Error",
            QrlinkerError::DatabaseOperation(_) => "Database Operation Error",
            QrlinkerError::LinkConfiguration(_) => "Link Configuration Error",
            QrlinkerError::TransientStorage(_) => "Transient Storage Error",
            QrlinkerError::Validation(_) => "Validation Error",
            QrlinkerError::NotFound(_) => "Resource Not Found",
            QrlinkerError::Serialization(_) => "Serialization Error",
            QrlinkerError::TimeParse(_) => "Time Parse Error",
            QrlinkerError::FileOperation(_) => "File Operation Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            QrlinkerError::DatabaseConfig(msg) => msg,
            QrlinkerError::DatabaseConnection(msg) => msg,
            QrlinkerError::DatabaseOperation(msg) => msg,
            QrlinkerError::LinkConfiguration(msg) => msg,
            QrlinkerError::TransientStorage(msg) => msg,
            QrlinkerError::Validation(msg) => msg,
            QrlinkerError::NotFound(msg) => msg,
            QrlinkerError::Serialization(msg) => msg,
            QrlinkerError::TimeParse(msg) => msg,
            QrlinkerError::FileOperation(msg) => msg,
        }
    }

    /// 瞬态错误（存储暂时不可达），调用方可重试或按配置降级
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            QrlinkerError::TransientStorage(_) | QrlinkerError::DatabaseConnection(_)
        )
    }

    /// 格式化为彩色输出（用于 Server 模式）
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for QrlinkerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 默认使用简洁格式
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for QrlinkerError {}

// 便捷的构造函数
impl QrlinkerError {
    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        QrlinkerError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        QrlinkerError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        QrlinkerError::DatabaseOperation(msg.into())
    }

    pub fn link_configuration<T: Into<String>>(msg: T) -> Self {
        QrlinkerError::LinkConfiguration(msg.into())
    }

    pub fn transient_storage<T: Into<String>>(msg: T) -> Self {
        QrlinkerError::TransientStorage(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        QrlinkerError::Validation(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        QrlinkerError::NotFound(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        QrlinkerError::Serialization(msg.into())
    }

    pub fn time_parse<T: Into<String>>(msg: T) -> Self {
        QrlinkerError::TimeParse(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        QrlinkerError::FileOperation(msg.into())
    }
}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for QrlinkerError {
    fn from(err: sea_orm::DbErr) -> Self {
        QrlinkerError::DatabaseOperation(err.to_string())
    }
}

impl From<std::io::Error> for QrlinkerError {
    fn from(err: std::io::Error) -> Self {
        QrlinkerError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for QrlinkerError {
    fn from(err: serde_json::Error) -> Self {
        QrlinkerError::Serialization(err.to_string())
    }
}

impl From<chrono::ParseError> for QrlinkerError {
    fn from(err: chrono::ParseError) -> Self {
        QrlinkerError::TimeParse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, QrlinkerError>;
