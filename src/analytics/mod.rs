pub mod global;
pub mod manager;
pub mod sink;

pub use manager::ScanManager;
pub use sink::{DetailedScanSink, ScanSink};

use chrono::{DateTime, Utc};

/// 详细扫码信息
#[derive(Debug, Clone)]
pub struct ScanDetail {
    /// 短链接代码
    pub code: String,
    /// 命中的内容槽
    pub slot_id: Option<String>,
    /// 命中的规则类型 (first-return / date-rule / default)
    pub matched_rule: Option<String>,
    /// 扫码时间戳
    pub timestamp: DateTime<Utc>,
    /// 来源页面 (Referer header)
    pub referrer: Option<String>,
    /// 用户代理 (User-Agent header)
    pub user_agent: Option<String>,
    /// 客户端 IP 地址
    pub ip_address: Option<String>,
    /// 国家代码 (ISO 3166-1 alpha-2)
    pub country: Option<String>,
    /// 城市名称
    pub city: Option<String>,
}

impl ScanDetail {
    pub fn new(code: String) -> Self {
        Self {
            code,
            slot_id: None,
            matched_rule: None,
            timestamp: Utc::now(),
            referrer: None,
            user_agent: None,
            ip_address: None,
            country: None,
            city: None,
        }
    }

    /// 记录解析结果
    pub fn with_resolution(mut self, slot_id: String, matched_rule: &str) -> Self {
        self.slot_id = Some(slot_id);
        self.matched_rule = Some(matched_rule.to_string());
        self
    }

    /// 设置地理位置信息
    pub fn with_geo(mut self, country: Option<String>, city: Option<String>) -> Self {
        self.country = country;
        self.city = city;
        self
    }
}
