//! 时间窗与星期匹配
//!
//! DateRule 的求值基础：
//! - "HH:MM" 24 小时制解析（严格格式）
//! - 两端闭区间的时间窗，支持跨午夜（start > end 时窗口延伸到次日）
//! - 星期集合匹配（链接所有者时区下的日历日，空集 = 每天）
//!
//! 所有解析失败都让规则不匹配，绝不让单条坏规则影响整个链接的解析。

use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveTime, Timelike, Weekday};
use chrono_tz::Tz;

use crate::adaptive::model::DateRule;
use crate::errors::{QrlinkerError, Result};

/// 解析 "HH:MM"（24 小时制）
pub fn parse_time_of_day(input: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(input.trim(), "%H:%M")
        .map_err(|e| QrlinkerError::time_parse(format!("无效的时间格式 '{}': {}", input, e)))
}

/// 一条规则的时间窗，两端都是闭区间
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    start: Option<NaiveTime>,
    end: Option<NaiveTime>,
}

impl TimeWindow {
    /// 从规则的存储字段构造，任一字段格式非法返回错误
    pub fn from_rule(rule: &DateRule) -> Result<Self> {
        let start = rule
            .start_time
            .as_deref()
            .map(parse_time_of_day)
            .transpose()?;
        let end = rule.end_time.as_deref().map(parse_time_of_day).transpose()?;
        Ok(Self { start, end })
    }

    /// 时刻是否落在窗口内（分钟精度，边界包含）
    ///
    /// start > end 视为跨午夜窗口：匹配 `t >= start || t <= end`。
    pub fn contains(&self, t: NaiveTime) -> bool {
        let t = minutes_of_day(t);
        match (self.start.map(minutes_of_day), self.end.map(minutes_of_day)) {
            (None, None) => true,
            (Some(start), None) => t >= start,
            (None, Some(end)) => t <= end,
            (Some(start), Some(end)) if start <= end => start <= t && t <= end,
            (Some(start), Some(end)) => t >= start || t <= end,
        }
    }
}

fn minutes_of_day(t: NaiveTime) -> u32 {
    t.hour() * 60 + t.minute()
}

/// 星期集合匹配：空集匹配任何一天，无法解析的名称被忽略
pub fn days_match(days: &[String], day: Weekday) -> bool {
    if days.is_empty() {
        return true;
    }
    days.iter()
        .filter_map(|name| Weekday::from_str(name.trim()).ok())
        .any(|d| d == day)
}

/// 规则是否匹配给定的本地时刻
///
/// 时间字段无法解析时规则不匹配（坏规则降级为"跳过"）。
pub fn rule_matches(rule: &DateRule, local: DateTime<Tz>) -> bool {
    if !days_match(&rule.days, local.weekday()) {
        return false;
    }
    match TimeWindow::from_rule(rule) {
        Ok(window) => window.contains(local.time()),
        Err(_) => false,
    }
}
