//! Adaptive 解析引擎性能基准测试

use chrono::{TimeZone, Utc};
use criterion::{Criterion, criterion_group, criterion_main};

use qrlinker::adaptive::Resolver;
use qrlinker::adaptive::model::{AdaptiveQrc, DateRule, Slot};

fn make_link(rule_count: usize) -> AdaptiveQrc {
    let slots: Vec<Slot> = (0..4)
        .map(|i| Slot {
            id: format!("slot-{}", i),
            name: format!("Slot {}", i),
            content: format!("https://example.com/{}", i),
        })
        .collect();

    // 全部不命中的窗口，强制扫完整个规则数组
    let date_rules: Vec<DateRule> = (0..rule_count)
        .map(|i| DateRule {
            slot: format!("slot-{}", i % 4),
            days: vec!["Sat".to_string(), "Sun".to_string()],
            start_time: Some("03:00".to_string()),
            end_time: Some("04:00".to_string()),
        })
        .collect();

    AdaptiveQrc {
        id: "bench-link".to_string(),
        code: "bench".to_string(),
        owner: None,
        slots,
        date_rules,
        first_return: None,
        default_slot: Some("slot-0".to_string()),
        timezone: chrono_tz::UTC,
        scan_count: 0,
        scan_limit: 0,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

// ============== resolve_date_rules 基准测试 ==============

fn bench_resolve_date_rules(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolver/resolve_date_rules");

    // 2026-03-02 周一 12:00
    let now = Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap();

    for rule_count in [1usize, 8, 32] {
        let link = make_link(rule_count);
        group.bench_function(format!("miss_all_{}_rules", rule_count), |b| {
            b.iter(|| {
                let r = Resolver::resolve_date_rules(&link, now, link.timezone).unwrap();
                assert_eq!(r.slot_id, "slot-0");
            });
        });
    }

    // 第一条规则即命中
    let mut hit_link = make_link(8);
    hit_link.date_rules.insert(
        0,
        DateRule {
            slot: "slot-1".to_string(),
            days: vec![],
            start_time: None,
            end_time: None,
        },
    );
    group.bench_function("first_rule_hits", |b| {
        b.iter(|| {
            let r = Resolver::resolve_date_rules(&hit_link, now, hit_link.timezone).unwrap();
            assert_eq!(r.slot_id, "slot-1");
        });
    });

    group.finish();
}

criterion_group!(benches, bench_resolve_date_rules);
criterion_main!(benches);
