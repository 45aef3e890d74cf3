use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

/// 内容槽：一个可被选中的具名内容变体
///
/// `content` 对解析引擎是不透明负载（URL、文本等），
/// 如何呈现由 HTTP 层决定。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    /// 链接内唯一
    pub id: String,
    /// 展示名称，无语义
    #[serde(default)]
    pub name: String,
    pub content: String,
}

/// 日期/时间规则：把一个时间窗映射到一个内容槽
///
/// 字段均为存储形态（字符串），解析在求值时进行，
/// 解析失败的规则视为不匹配而非报错。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DateRule {
    /// 引用的 Slot id
    pub slot: String,
    /// 星期名称集合（"Mon" / "monday" 等），空集 = 每天
    #[serde(default)]
    pub days: Vec<String>,
    /// "HH:MM" 24 小时制，缺省表示该侧无界
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
}

/// 首扫/回访规则：每个链接至多一条
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FirstReturnRule {
    #[serde(default)]
    pub enabled: bool,
    /// 该指纹首次扫码时展示的槽
    pub first_slot: String,
    /// 回访时展示的槽
    pub return_slot: String,
}

/// 自适应短链聚合根
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdaptiveQrc {
    pub id: String,
    pub code: String,
    #[serde(default)]
    pub owner: Option<String>,
    pub slots: Vec<Slot>,
    #[serde(default)]
    pub date_rules: Vec<DateRule>,
    #[serde(default)]
    pub first_return: Option<FirstReturnRule>,
    /// 兜底槽，惯例上是第一个槽
    #[serde(default)]
    pub default_slot: Option<String>,
    /// 规则求值所用的链接所有者时区
    pub timezone: Tz,
    pub scan_count: i64,
    /// 0 = 不限制
    pub scan_limit: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AdaptiveQrc {
    /// 按 id 查找内容槽
    ///
    /// 未找到不是错误：引用已删除槽的规则会被跳过。
    pub fn slot(&self, id: &str) -> Option<&Slot> {
        self.slots.iter().find(|s| s.id == id)
    }

    /// 首扫/回访规则是否生效
    pub fn first_return_enabled(&self) -> bool {
        self.first_return.as_ref().is_some_and(|fr| fr.enabled)
    }

    /// 扫码配额是否已用尽（scan_limit = 0 表示不限制）
    pub fn is_over_quota(&self) -> bool {
        self.scan_limit > 0 && self.scan_count >= self.scan_limit
    }
}

/// 解析命中的规则类型
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString, Default,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum MatchedRule {
    FirstReturn,
    DateRule,
    #[default]
    Default,
}

/// 解析结果：交给 HTTP 层跳转或渲染
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub slot_id: String,
    pub content: String,
    pub matched: MatchedRule,
}

impl Resolution {
    pub(crate) fn from_slot(slot: &Slot, matched: MatchedRule) -> Self {
        Self {
            slot_id: slot.id.clone(),
            content: slot.content.clone(),
            matched,
        }
    }
}
