//! Adaptive QRC 管理服务
//!
//! 链接配置的创建/更新/删除/查询业务逻辑，供 HTTP 管理接口调用。
//! 配置校验在这里完成：槽 id 唯一、规则引用存在的槽、HH:MM 可解析、
//! 日期规则与首扫/回访规则互斥。更新时对"槽被删除"的情况做级联清理，
//! 解析引擎因此在正常路径上见不到悬空引用（但它仍会防御性跳过）。

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{Utc, Weekday};
use chrono_tz::Tz;
use serde::Deserialize;
use tracing::{debug, info};

use crate::adaptive::model::{AdaptiveQrc, DateRule, FirstReturnRule, Slot};
use crate::adaptive::time_window::TimeWindow;
use crate::cache::ObjectCache;
use crate::errors::{QrlinkerError, Result};
use crate::storage::{QrcPage, SeaOrmStorage};
use crate::utils::{generate_random_code, is_valid_short_code};
use crate::visitor::VisitorTracker;

/// 自动生成短码的长度
const GENERATED_CODE_LENGTH: usize = 6;
/// 短码冲突时的重试次数
const CODE_GENERATION_ATTEMPTS: usize = 5;

// ============ Request DTOs ============

/// 创建链接请求
#[derive(Debug, Clone, Deserialize)]
pub struct CreateQrcRequest {
    /// 短码（不提供时自动生成）
    pub code: Option<String>,
    pub owner: Option<String>,
    pub slots: Vec<Slot>,
    #[serde(default)]
    pub date_rules: Vec<DateRule>,
    #[serde(default)]
    pub first_return: Option<FirstReturnRule>,
    /// 兜底槽，缺省取第一个槽
    #[serde(default)]
    pub default_slot: Option<String>,
    /// IANA 时区名，缺省 UTC
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub scan_limit: Option<i64>,
}

/// 更新链接请求（整体替换配置）
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateQrcRequest {
    pub slots: Vec<Slot>,
    #[serde(default)]
    pub date_rules: Vec<DateRule>,
    #[serde(default)]
    pub first_return: Option<FirstReturnRule>,
    #[serde(default)]
    pub default_slot: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub scan_limit: Option<i64>,
}

// ============ QrcService ============

pub struct QrcService {
    storage: Arc<SeaOrmStorage>,
    cache: Arc<dyn ObjectCache>,
    tracker: Arc<dyn VisitorTracker>,
}

impl QrcService {
    pub fn new(
        storage: Arc<SeaOrmStorage>,
        cache: Arc<dyn ObjectCache>,
        tracker: Arc<dyn VisitorTracker>,
    ) -> Self {
        Self {
            storage,
            cache,
            tracker,
        }
    }

    pub async fn create(&self, req: CreateQrcRequest) -> Result<AdaptiveQrc> {
        let timezone = parse_timezone(req.timezone.as_deref())?;
        validate_configuration(
            &req.slots,
            &req.date_rules,
            req.first_return.as_ref(),
            req.default_slot.as_deref(),
        )?;

        let code = match req.code {
            Some(code) => {
                if !is_valid_short_code(&code) {
                    return Err(QrlinkerError::validation(format!(
                        "短码 '{}' 非法：仅允许字母数字、'-'、'_'，最长 64 字符",
                        code
                    )));
                }
                if self.storage.code_exists(&code).await? {
                    return Err(QrlinkerError::validation(format!("短码 '{}' 已被占用", code)));
                }
                code
            }
            None => self.generate_unused_code().await?,
        };

        let now = Utc::now();
        let default_slot = req
            .default_slot
            .or_else(|| req.slots.first().map(|s| s.id.clone()));

        let link = AdaptiveQrc {
            id: uuid::Uuid::new_v4().to_string(),
            code,
            owner: req.owner,
            slots: req.slots,
            date_rules: req.date_rules,
            first_return: req.first_return,
            default_slot,
            timezone,
            scan_count: 0,
            scan_limit: req.scan_limit.unwrap_or(0).max(0),
            created_at: now,
            updated_at: now,
        };

        self.storage.insert_qrc(&link).await?;
        info!("Created adaptive QRC: {} ({} slots)", link.code, link.slots.len());
        Ok(link)
    }

    pub async fn update(&self, code: &str, req: UpdateQrcRequest) -> Result<AdaptiveQrc> {
        let existing = self
            .storage
            .get_by_code(code)
            .await?
            .ok_or_else(|| QrlinkerError::not_found(format!("链接不存在: {}", code)))?;

        let timezone = match req.timezone.as_deref() {
            Some(tz) => parse_timezone(Some(tz))?,
            None => existing.timezone,
        };

        // 槽被删除后的级联清理，再做一致性校验
        let (date_rules, first_return, default_slot) = cascade_slot_references(
            &req.slots,
            req.date_rules,
            req.first_return,
            req.default_slot,
            code,
        );
        validate_configuration(
            &req.slots,
            &date_rules,
            first_return.as_ref(),
            default_slot.as_deref(),
        )?;

        let link = AdaptiveQrc {
            id: existing.id,
            code: existing.code,
            owner: existing.owner,
            slots: req.slots,
            date_rules,
            first_return,
            default_slot,
            timezone,
            scan_count: existing.scan_count,
            scan_limit: req.scan_limit.unwrap_or(existing.scan_limit).max(0),
            created_at: existing.created_at,
            updated_at: Utc::now(),
        };

        self.storage.update_qrc(&link).await?;
        self.cache.remove(code).await;
        info!("Updated adaptive QRC: {}", link.code);
        Ok(link)
    }

    pub async fn get(&self, code: &str) -> Result<AdaptiveQrc> {
        self.storage
            .get_by_code(code)
            .await?
            .ok_or_else(|| QrlinkerError::not_found(format!("链接不存在: {}", code)))
    }

    pub async fn list(&self, page: u64, page_size: u64) -> Result<QrcPage> {
        self.storage.list_qrcs(page, page_size).await
    }

    /// 删除链接：行、扫码日志、访客记录、缓存条目一并清理
    pub async fn delete(&self, code: &str) -> Result<()> {
        let Some(link_id) = self.storage.delete_qrc(code).await? else {
            return Err(QrlinkerError::not_found(format!("链接不存在: {}", code)));
        };

        let purged = self.tracker.purge_link(&link_id).await?;
        self.cache.remove(code).await;
        info!(
            "Deleted adaptive QRC: {} ({} visitor records purged)",
            code, purged
        );
        Ok(())
    }

    async fn generate_unused_code(&self) -> Result<String> {
        for _ in 0..CODE_GENERATION_ATTEMPTS {
            let code = generate_random_code(GENERATED_CODE_LENGTH);
            if !self.storage.code_exists(&code).await? {
                return Ok(code);
            }
            debug!("Generated code '{}' collided, retrying", code);
        }
        Err(QrlinkerError::validation(
            "短码生成多次冲突，请重试或显式指定短码",
        ))
    }
}

// ============ 配置校验 ============

fn parse_timezone(input: Option<&str>) -> Result<Tz> {
    match input {
        None => Ok(chrono_tz::UTC),
        Some(name) => name
            .parse()
            .map_err(|_| QrlinkerError::validation(format!("无法识别的时区: '{}'", name))),
    }
}

/// 配置一致性校验（创建与更新共用）
///
/// 解析引擎对坏配置是宽容的；这里是严格的那一侧，
/// 把问题挡在写入之前。
fn validate_configuration(
    slots: &[Slot],
    date_rules: &[DateRule],
    first_return: Option<&FirstReturnRule>,
    default_slot: Option<&str>,
) -> Result<()> {
    if slots.is_empty() {
        return Err(QrlinkerError::validation("链接至少需要一个内容槽"));
    }

    let mut ids = HashSet::new();
    for slot in slots {
        if slot.id.trim().is_empty() {
            return Err(QrlinkerError::validation("内容槽 id 不能为空"));
        }
        if !ids.insert(slot.id.as_str()) {
            return Err(QrlinkerError::validation(format!(
                "内容槽 id 重复: '{}'",
                slot.id
            )));
        }
        if slot.content.trim().is_empty() {
            return Err(QrlinkerError::validation(format!(
                "内容槽 '{}' 的 content 不能为空",
                slot.id
            )));
        }
    }

    // 日期规则 OR 首扫/回访规则，二选一
    let first_return_enabled = first_return.is_some_and(|fr| fr.enabled);
    if first_return_enabled && !date_rules.is_empty() {
        return Err(QrlinkerError::validation(
            "日期规则与首扫/回访规则互斥，请只启用其中一种",
        ));
    }

    for (idx, rule) in date_rules.iter().enumerate() {
        if !ids.contains(rule.slot.as_str()) {
            return Err(QrlinkerError::validation(format!(
                "第 {} 条日期规则引用了不存在的内容槽 '{}'",
                idx + 1,
                rule.slot
            )));
        }
        TimeWindow::from_rule(rule).map_err(|e| {
            QrlinkerError::validation(format!("第 {} 条日期规则时间非法: {}", idx + 1, e.message()))
        })?;
        for day in &rule.days {
            Weekday::from_str(day.trim()).map_err(|_| {
                QrlinkerError::validation(format!(
                    "第 {} 条日期规则的星期 '{}' 无法识别",
                    idx + 1,
                    day
                ))
            })?;
        }
    }

    if let Some(fr) = first_return.filter(|fr| fr.enabled) {
        for (field, slot_id) in [("first_slot", &fr.first_slot), ("return_slot", &fr.return_slot)] {
            if !ids.contains(slot_id.as_str()) {
                return Err(QrlinkerError::validation(format!(
                    "首扫/回访规则的 {} 引用了不存在的内容槽 '{}'",
                    field, slot_id
                )));
            }
        }
    }

    if let Some(id) = default_slot
        && !ids.contains(id)
    {
        return Err(QrlinkerError::validation(format!(
            "兜底槽引用了不存在的内容槽 '{}'",
            id
        )));
    }

    Ok(())
}

/// 更新路径的级联清理：槽被删除时移除悬空引用
///
/// - 引用缺失槽的日期规则被移除
/// - 首扫/回访规则任一槽缺失时整条停用移除
/// - 兜底槽缺失时回落到第一个槽
fn cascade_slot_references(
    slots: &[Slot],
    date_rules: Vec<DateRule>,
    first_return: Option<FirstReturnRule>,
    default_slot: Option<String>,
    code: &str,
) -> (Vec<DateRule>, Option<FirstReturnRule>, Option<String>) {
    let ids: HashSet<&str> = slots.iter().map(|s| s.id.as_str()).collect();

    let before = date_rules.len();
    let date_rules: Vec<DateRule> = date_rules
        .into_iter()
        .filter(|r| ids.contains(r.slot.as_str()))
        .collect();
    if date_rules.len() < before {
        debug!(
            "Link {}: dropped {} date rule(s) referencing removed slots",
            code,
            before - date_rules.len()
        );
    }

    let first_return = first_return.filter(|fr| {
        let intact = ids.contains(fr.first_slot.as_str()) && ids.contains(fr.return_slot.as_str());
        if !intact {
            debug!(
                "Link {}: first/return rule dropped, its slots were removed",
                code
            );
        }
        intact
    });

    let default_slot = match default_slot {
        Some(id) if ids.contains(id.as_str()) => Some(id),
        _ => slots.first().map(|s| s.id.clone()),
    };

    (date_rules, first_return, default_slot)
}

#[cfg(test)]
mod validation_tests {
    use super::*;

    fn slot(id: &str) -> Slot {
        Slot {
            id: id.to_string(),
            name: String::new(),
            content: format!("https://{}.example", id),
        }
    }

    fn rule_for(slot: &str) -> DateRule {
        DateRule {
            slot: slot.to_string(),
            days: vec!["Mon".to_string()],
            start_time: Some("11:00".to_string()),
            end_time: Some("14:00".to_string()),
        }
    }

    #[test]
    fn test_valid_configuration_passes() {
        let slots = vec![slot("A"), slot("B")];
        assert!(validate_configuration(&slots, &[rule_for("B")], None, Some("A")).is_ok());
    }

    #[test]
    fn test_duplicate_slot_ids_rejected() {
        let slots = vec![slot("A"), slot("A")];
        assert!(validate_configuration(&slots, &[], None, None).is_err());
    }

    #[test]
    fn test_rule_referencing_missing_slot_rejected() {
        let slots = vec![slot("A")];
        assert!(validate_configuration(&slots, &[rule_for("B")], None, None).is_err());
    }

    #[test]
    fn test_exclusivity_enforced() {
        let slots = vec![slot("A"), slot("B")];
        let fr = FirstReturnRule {
            enabled: true,
            first_slot: "A".to_string(),
            return_slot: "B".to_string(),
        };
        let err =
            validate_configuration(&slots, &[rule_for("B")], Some(&fr), Some("A")).unwrap_err();
        assert!(matches!(err, QrlinkerError::Validation(_)));

        // 未启用的 first_return 可以与日期规则共存
        let disabled = FirstReturnRule {
            enabled: false,
            ..fr
        };
        assert!(validate_configuration(&slots, &[rule_for("B")], Some(&disabled), Some("A")).is_ok());
    }

    #[test]
    fn test_malformed_time_rejected_at_config_time() {
        let slots = vec![slot("A")];
        let mut bad = rule_for("A");
        bad.start_time = Some("25:00".to_string());
        assert!(validate_configuration(&slots, &[bad], None, None).is_err());
    }

    #[test]
    fn test_unknown_weekday_rejected_at_config_time() {
        let slots = vec![slot("A")];
        let mut bad = rule_for("A");
        bad.days = vec!["Funday".to_string()];
        assert!(validate_configuration(&slots, &[bad], None, None).is_err());
    }

    #[test]
    fn test_cascade_drops_dangling_references() {
        let slots = vec![slot("A")];
        let fr = FirstReturnRule {
            enabled: true,
            first_slot: "A".to_string(),
            return_slot: "GONE".to_string(),
        };
        let (rules, first_return, default_slot) = cascade_slot_references(
            &slots,
            vec![rule_for("GONE"), rule_for("A")],
            Some(fr),
            Some("GONE".to_string()),
            "demo",
        );
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].slot, "A");
        assert!(first_return.is_none());
        assert_eq!(default_slot.as_deref(), Some("A"));
    }

    #[test]
    fn test_parse_timezone() {
        assert_eq!(parse_timezone(None).unwrap(), chrono_tz::UTC);
        assert_eq!(
            parse_timezone(Some("Asia/Shanghai")).unwrap().name(),
            "Asia/Shanghai"
        );
        assert!(parse_timezone(Some("Not/AZone")).is_err());
    }
}
