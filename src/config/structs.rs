use serde::{Deserialize, Serialize};

/// 静态配置（从 TOML 加载，启动时使用）
///
/// 包含基础设施配置：
/// - server: 服务器地址、端口、路由前缀
/// - database: 数据库连接配置
/// - cache: 链接配置缓存
/// - logging: 日志配置
/// - analytics: 扫码统计配置
/// - resolver: Adaptive QRC 解析策略
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StaticConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
}

impl StaticConfig {
    /// 从 TOML 文件和环境变量加载配置
    ///
    /// 优先级：ENV > config.toml > 默认值
    /// ENV 前缀：QL，分隔符：__
    /// 示例：QL__SERVER__PORT=9999
    pub fn load() -> Self {
        use config::{Config, Environment, File};

        let path = "config.toml";

        let builder = Config::builder()
            // 1. 从 TOML 文件加载（可选）
            .add_source(File::with_name(path).required(false))
            // 2. 从环境变量覆盖，前缀 QL，分隔符 __
            .add_source(
                Environment::with_prefix("QL")
                    .separator("__")
                    .try_parsing(true),
            );

        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<StaticConfig>() {
                Ok(config) => {
                    if std::path::Path::new(path).exists() {
                        eprintln!("[INFO] Configuration loaded from: {}", path);
                    }
                    config
                }
                Err(e) => {
                    eprintln!("[ERROR] Failed to deserialize config: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("[ERROR] Failed to build config: {}", e);
                Self::default()
            }
        }
    }

    /// 生成示例 TOML 配置文件
    pub fn generate_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config)
            .unwrap_or_else(|e| format!("Error generating sample config: {}", e))
    }
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    #[serde(default = "default_cpu_count")]
    pub cpu_count: usize,
    #[serde(default = "default_admin_prefix")]
    pub admin_prefix: String,
    #[serde(default = "default_health_prefix")]
    pub health_prefix: String,
}

/// 数据库连接配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_database_pool_size")]
    pub pool_size: u32,
}

/// 链接配置缓存
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// "memory"（moka）或 "null"
    #[serde(rename = "type")]
    #[serde(default = "default_cache_type")]
    pub cache_type: String,
    #[serde(default = "default_cache_ttl")]
    pub default_ttl: u64,
    #[serde(default = "default_cache_capacity")]
    pub max_capacity: u64,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// EnvFilter 语法，如 "info" 或 "qrlinker=debug,info"
    #[serde(default = "default_log_level")]
    pub level: String,
    /// "plain" 或 "json"
    #[serde(default = "default_log_format")]
    pub format: String,
    /// 日志文件路径，空字符串输出到控制台
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default = "default_log_rotation")]
    pub enable_rotation: bool,
    #[serde(default = "default_log_max_backups")]
    pub max_backups: u32,
}

/// 扫码统计配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// 扫码计数刷盘间隔（秒）
    #[serde(default = "default_flush_interval")]
    pub flush_interval_secs: u64,
    /// 是否记录详细扫码日志（referrer / IP / 地理位置）
    #[serde(default = "default_detailed_logging")]
    pub enable_detailed_logging: bool,
    /// MaxMind GeoLite2 数据库路径，未配置则禁用地理标注
    #[serde(default)]
    pub maxminddb_path: Option<String>,
}

/// Adaptive QRC 解析策略
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// 访客存储失败时降级到默认内容槽（不记录访问）。
    /// false 时返回 503，由扫码方重试。
    #[serde(default)]
    pub degrade_to_default: bool,
    /// 扫码路径为空时的跳转地址
    #[serde(default = "default_fallback_url")]
    pub fallback_url: String,
}

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8080
}

fn default_cpu_count() -> usize {
    num_cpus::get()
}

fn default_admin_prefix() -> String {
    "/admin".to_string()
}

fn default_health_prefix() -> String {
    "/health".to_string()
}

fn default_database_url() -> String {
    "sqlite://qrlinker.db?mode=rwc".to_string()
}

fn default_database_pool_size() -> u32 {
    10
}

fn default_cache_type() -> String {
    "memory".to_string()
}

fn default_cache_ttl() -> u64 {
    300
}

fn default_cache_capacity() -> u64 {
    10_000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "plain".to_string()
}

fn default_log_rotation() -> bool {
    true
}

fn default_log_max_backups() -> u32 {
    7
}

fn default_flush_interval() -> u64 {
    10
}

fn default_detailed_logging() -> bool {
    true
}

fn default_fallback_url() -> String {
    "https://esap.cc/repo".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            cpu_count: default_cpu_count(),
            admin_prefix: default_admin_prefix(),
            health_prefix: default_health_prefix(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            pool_size: default_database_pool_size(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_type: default_cache_type(),
            default_ttl: default_cache_ttl(),
            max_capacity: default_cache_capacity(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
            enable_rotation: default_log_rotation(),
            max_backups: default_log_max_backups(),
        }
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            flush_interval_secs: default_flush_interval(),
            enable_detailed_logging: default_detailed_logging(),
            maxminddb_path: None,
        }
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            degrade_to_default: false,
            fallback_url: default_fallback_url(),
        }
    }
}
