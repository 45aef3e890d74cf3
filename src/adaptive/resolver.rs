//! Adaptive QRC 解析引擎
//!
//! 每次扫码执行一次，决定服务哪个内容槽：
//!
//! 1. 首扫/回访规则生效时优先（与日期规则互斥由配置层保证，
//!    两者同时存在时首扫/回访胜出，保证全序）。
//!    这是唯一可能等待的路径：访客追踪器的一次原子 check-and-record。
//! 2. 否则按声明顺序扫描日期规则，第一条匹配且槽可解析的规则胜出；
//!    引用已删除槽的规则被跳过，继续向后评估。
//! 3. 都不命中时落到兜底槽（default_slot，悬空时退回第一个槽）。
//!
//! 对 slots / 规则无任何修改；注入 `now` 与时区使日期分支可直接单测。

use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::debug;

use crate::adaptive::model::{AdaptiveQrc, MatchedRule, Resolution};
use crate::adaptive::time_window::rule_matches;
use crate::errors::{QrlinkerError, Result};
use crate::visitor::{VisitorClass, VisitorTracker};

pub struct Resolver {
    tracker: Arc<dyn VisitorTracker>,
}

impl Resolver {
    pub fn new(tracker: Arc<dyn VisitorTracker>) -> Self {
        Self { tracker }
    }

    /// 解析一次扫码
    ///
    /// 副作用：首扫/回访规则生效时恰好一次追踪器写入，其余路径零写入。
    /// 追踪器存储失败原样传出 `TransientStorage`，降级策略由调用方决定。
    pub async fn resolve(
        &self,
        link: &AdaptiveQrc,
        now: DateTime<Utc>,
        tz: Tz,
        fingerprint: &str,
    ) -> Result<Resolution> {
        if link.slots.is_empty() {
            return Err(QrlinkerError::link_configuration(format!(
                "链接 {} 没有任何内容槽",
                link.code
            )));
        }

        if let Some(fr) = link.first_return.as_ref().filter(|fr| fr.enabled) {
            let class = self
                .tracker
                .check_and_record(&link.id, fingerprint, now)
                .await?;
            let wanted = match class {
                VisitorClass::First => &fr.first_slot,
                VisitorClass::Returning => &fr.return_slot,
            };
            if let Some(slot) = link.slot(wanted) {
                return Ok(Resolution::from_slot(slot, MatchedRule::FirstReturn));
            }
            debug!(
                "First/return slot '{}' missing on link {}, falling back to default",
                wanted, link.code
            );
            return Self::default_resolution(link);
        }

        Self::resolve_date_rules(link, now, tz)
    }

    /// 纯日期规则路径（无副作用，可同步调用）
    ///
    /// 也用于访客存储故障时的降级解析。
    pub fn resolve_date_rules(link: &AdaptiveQrc, now: DateTime<Utc>, tz: Tz) -> Result<Resolution> {
        if link.slots.is_empty() {
            return Err(QrlinkerError::link_configuration(format!(
                "链接 {} 没有任何内容槽",
                link.code
            )));
        }

        let local = now.with_timezone(&tz);
        for rule in &link.date_rules {
            if !rule_matches(rule, local) {
                continue;
            }
            match link.slot(&rule.slot) {
                Some(slot) => return Ok(Resolution::from_slot(slot, MatchedRule::DateRule)),
                None => {
                    // 槽已被删除的悬空引用：跳过该条，继续向后评估
                    debug!(
                        "Date rule on link {} references missing slot '{}', skipped",
                        link.code, rule.slot
                    );
                    continue;
                }
            }
        }

        Self::default_resolution(link)
    }

    /// 兜底槽解析：default_slot → 第一个槽 → 配置错误
    pub fn default_resolution(link: &AdaptiveQrc) -> Result<Resolution> {
        if let Some(slot) = link.default_slot.as_deref().and_then(|id| link.slot(id)) {
            return Ok(Resolution::from_slot(slot, MatchedRule::Default));
        }
        match link.slots.first() {
            Some(slot) => Ok(Resolution::from_slot(slot, MatchedRule::Default)),
            None => Err(QrlinkerError::link_configuration(format!(
                "链接 {} 没有可用的兜底内容槽",
                link.code
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adaptive::model::{DateRule, FirstReturnRule, Slot};
    use crate::visitor::MemoryVisitorTracker;
    use chrono::TimeZone;

    fn slot(id: &str, content: &str) -> Slot {
        Slot {
            id: id.to_string(),
            name: format!("slot {}", id),
            content: content.to_string(),
        }
    }

    fn link(slots: Vec<Slot>, date_rules: Vec<DateRule>, default_slot: Option<&str>) -> AdaptiveQrc {
        AdaptiveQrc {
            id: "l-1".to_string(),
            code: "demo".to_string(),
            owner: None,
            slots,
            date_rules,
            first_return: None,
            default_slot: default_slot.map(|s| s.to_string()),
            timezone: chrono_tz::UTC,
            scan_count: 0,
            scan_limit: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn date_rule(slot: &str, days: &[&str], start: Option<&str>, end: Option<&str>) -> DateRule {
        DateRule {
            slot: slot.to_string(),
            days: days.iter().map(|d| d.to_string()).collect(),
            start_time: start.map(|s| s.to_string()),
            end_time: end.map(|s| s.to_string()),
        }
    }

    /// 2026-03-02 是周一
    fn monday_at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, h, m, 0).unwrap()
    }

    fn tuesday_at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 3, h, m, 0).unwrap()
    }

    #[test]
    fn test_lunch_hours_scenario() {
        // slots=[A,B], rule: B on Mon 11:00-14:00, default A
        let l = link(
            vec![slot("A", "https://a.example"), slot("B", "https://b.example")],
            vec![date_rule("B", &["Mon"], Some("11:00"), Some("14:00"))],
            Some("A"),
        );

        let hit = Resolver::resolve_date_rules(&l, monday_at(12, 0), chrono_tz::UTC).unwrap();
        assert_eq!(hit.slot_id, "B");
        assert_eq!(hit.matched, MatchedRule::DateRule);

        let after = Resolver::resolve_date_rules(&l, monday_at(15, 0), chrono_tz::UTC).unwrap();
        assert_eq!(after.slot_id, "A");
        assert_eq!(after.matched, MatchedRule::Default);

        let wrong_day = Resolver::resolve_date_rules(&l, tuesday_at(12, 0), chrono_tz::UTC).unwrap();
        assert_eq!(wrong_day.slot_id, "A");
        assert_eq!(wrong_day.matched, MatchedRule::Default);
    }

    #[test]
    fn test_first_rule_wins_over_later_match() {
        // 两条规则同时匹配，声明顺序靠前的胜出，与"具体程度"无关
        let l = link(
            vec![slot("A", "a"), slot("B", "b"), slot("C", "c")],
            vec![
                date_rule("B", &[], None, None),
                date_rule("C", &["Mon"], Some("11:00"), Some("14:00")),
            ],
            Some("A"),
        );
        let r = Resolver::resolve_date_rules(&l, monday_at(12, 0), chrono_tz::UTC).unwrap();
        assert_eq!(r.slot_id, "B");
    }

    #[test]
    fn test_dangling_rule_falls_through_to_next() {
        let l = link(
            vec![slot("A", "a"), slot("C", "c")],
            vec![
                date_rule("GONE", &[], None, None),
                date_rule("C", &[], None, None),
            ],
            Some("A"),
        );
        let r = Resolver::resolve_date_rules(&l, monday_at(12, 0), chrono_tz::UTC).unwrap();
        assert_eq!(r.slot_id, "C");
        assert_eq!(r.matched, MatchedRule::DateRule);
    }

    #[test]
    fn test_dangling_rules_fall_back_to_default() {
        let l = link(
            vec![slot("A", "a")],
            vec![date_rule("GONE", &[], None, None)],
            Some("A"),
        );
        let r = Resolver::resolve_date_rules(&l, monday_at(12, 0), chrono_tz::UTC).unwrap();
        assert_eq!(r.slot_id, "A");
        assert_eq!(r.matched, MatchedRule::Default);
    }

    #[test]
    fn test_malformed_rule_degrades_to_default() {
        let l = link(
            vec![slot("A", "a"), slot("B", "b")],
            vec![date_rule("B", &[], Some("nope"), Some("14:00"))],
            Some("A"),
        );
        let r = Resolver::resolve_date_rules(&l, monday_at(12, 0), chrono_tz::UTC).unwrap();
        assert_eq!(r.slot_id, "A");
    }

    #[test]
    fn test_unset_default_falls_back_to_first_slot() {
        let l = link(vec![slot("A", "a"), slot("B", "b")], vec![], None);
        let r = Resolver::resolve_date_rules(&l, monday_at(9, 0), chrono_tz::UTC).unwrap();
        assert_eq!(r.slot_id, "A");
        assert_eq!(r.matched, MatchedRule::Default);
    }

    #[test]
    fn test_empty_link_is_configuration_error() {
        let l = link(vec![], vec![], None);
        let err = Resolver::resolve_date_rules(&l, monday_at(9, 0), chrono_tz::UTC).unwrap_err();
        assert!(matches!(err, QrlinkerError::LinkConfiguration(_)));
    }

    #[test]
    fn test_timezone_governs_day_and_time() {
        // UTC 周二 02:30 = 纽约周一 21:30
        let tz: Tz = "America/New_York".parse().unwrap();
        let l = link(
            vec![slot("A", "a"), slot("B", "b")],
            vec![date_rule("B", &["Mon"], Some("21:00"), Some("22:00"))],
            Some("A"),
        );
        let r = Resolver::resolve_date_rules(&l, tuesday_at(2, 30), tz).unwrap();
        assert_eq!(r.slot_id, "B");
        // 同一时刻按 UTC 求值则是周二，不命中
        let r = Resolver::resolve_date_rules(&l, tuesday_at(2, 30), chrono_tz::UTC).unwrap();
        assert_eq!(r.slot_id, "A");
    }

    #[test]
    fn test_determinism() {
        let l = link(
            vec![slot("A", "a"), slot("B", "b")],
            vec![date_rule("B", &["Mon"], Some("11:00"), Some("14:00"))],
            Some("A"),
        );
        let now = monday_at(12, 0);
        let first = Resolver::resolve_date_rules(&l, now, chrono_tz::UTC).unwrap();
        for _ in 0..10 {
            let again = Resolver::resolve_date_rules(&l, now, chrono_tz::UTC).unwrap();
            assert_eq!(again, first);
        }
    }

    #[tokio::test]
    async fn test_first_return_classification() {
        let tracker = Arc::new(MemoryVisitorTracker::new());
        let resolver = Resolver::new(tracker.clone());
        let mut l = link(vec![slot("A", "a"), slot("B", "b")], vec![], Some("A"));
        l.first_return = Some(FirstReturnRule {
            enabled: true,
            first_slot: "A".to_string(),
            return_slot: "B".to_string(),
        });

        let now = monday_at(10, 0);
        let r1 = resolver.resolve(&l, now, chrono_tz::UTC, "f1").await.unwrap();
        assert_eq!(r1.slot_id, "A");
        assert_eq!(r1.matched, MatchedRule::FirstReturn);

        let r2 = resolver.resolve(&l, now, chrono_tz::UTC, "f1").await.unwrap();
        assert_eq!(r2.slot_id, "B");
        assert_eq!(r2.matched, MatchedRule::FirstReturn);

        let r3 = resolver.resolve(&l, now, chrono_tz::UTC, "f2").await.unwrap();
        assert_eq!(r3.slot_id, "A");

        // f1 + f2 各一条记录，重复解析不追加
        assert_eq!(tracker.record_count(), 2);
    }

    #[tokio::test]
    async fn test_first_return_takes_precedence_over_date_rules() {
        let tracker = Arc::new(MemoryVisitorTracker::new());
        let resolver = Resolver::new(tracker);
        let mut l = link(
            vec![slot("A", "a"), slot("B", "b"), slot("C", "c")],
            vec![date_rule("C", &[], None, None)],
            Some("A"),
        );
        l.first_return = Some(FirstReturnRule {
            enabled: true,
            first_slot: "A".to_string(),
            return_slot: "B".to_string(),
        });

        let r = resolver
            .resolve(&l, monday_at(12, 0), chrono_tz::UTC, "fp")
            .await
            .unwrap();
        assert_eq!(r.slot_id, "A");
        assert_eq!(r.matched, MatchedRule::FirstReturn);
    }

    #[tokio::test]
    async fn test_disabled_first_return_uses_date_rules() {
        let tracker = Arc::new(MemoryVisitorTracker::new());
        let resolver = Resolver::new(tracker.clone());
        let mut l = link(
            vec![slot("A", "a"), slot("C", "c")],
            vec![date_rule("C", &[], None, None)],
            Some("A"),
        );
        l.first_return = Some(FirstReturnRule {
            enabled: false,
            first_slot: "A".to_string(),
            return_slot: "C".to_string(),
        });

        let r = resolver
            .resolve(&l, monday_at(12, 0), chrono_tz::UTC, "fp")
            .await
            .unwrap();
        assert_eq!(r.slot_id, "C");
        assert_eq!(r.matched, MatchedRule::DateRule);
        // 日期规则路径零追踪器写入
        assert_eq!(tracker.record_count(), 0);
    }

    #[tokio::test]
    async fn test_dangling_first_slot_falls_back_to_default() {
        let tracker = Arc::new(MemoryVisitorTracker::new());
        let resolver = Resolver::new(tracker);
        let mut l = link(vec![slot("A", "a")], vec![], Some("A"));
        l.first_return = Some(FirstReturnRule {
            enabled: true,
            first_slot: "GONE".to_string(),
            return_slot: "A".to_string(),
        });

        let r = resolver
            .resolve(&l, monday_at(12, 0), chrono_tz::UTC, "fp")
            .await
            .unwrap();
        assert_eq!(r.slot_id, "A");
        assert_eq!(r.matched, MatchedRule::Default);
    }
}
