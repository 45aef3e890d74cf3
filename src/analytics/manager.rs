//! 扫码统计管理器
//!
//! 负责收集和刷新扫码数据：
//! - 高并发扫码计数（DashMap 缓冲）
//! - 定时刷盘到存储后端
//! - 详细扫码日志记录（可选）

use dashmap::DashMap;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use tokio::sync::Mutex;
use tokio::time::{Duration, sleep};
use tracing::{debug, trace, warn};

use crate::analytics::{DetailedScanSink, ScanDetail, ScanSink};

/// 扫码缓冲区，封装所有可变状态
struct ScanBuffer {
    /// 按短码聚合的扫码计数
    counts: DashMap<String, usize>,
    /// 详细扫码日志（自增 id 保证 drain 时不丢新条目）
    details: DashMap<u64, ScanDetail>,
    next_detail_id: AtomicU64,
    /// 刷盘锁，防止并发刷盘
    flush_lock: Mutex<()>,
}

impl ScanBuffer {
    fn new() -> Self {
        Self {
            counts: DashMap::new(),
            details: DashMap::new(),
            next_detail_id: AtomicU64::new(0),
            flush_lock: Mutex::new(()),
        }
    }

    fn increment(&self, key: &str) {
        *self.counts.entry(key.to_string()).or_insert(0) += 1;
        trace!("ScanBuffer: Incremented key: {}", key);
    }

    fn push_detail(&self, detail: ScanDetail) {
        let id = self.next_detail_id.fetch_add(1, Ordering::Relaxed);
        self.details.insert(id, detail);
    }

    /// 收集计数并清空（逐个 remove，窗口期新增不受影响）
    fn drain_counts(&self) -> Vec<(String, usize)> {
        let keys: Vec<String> = self.counts.iter().map(|r| r.key().clone()).collect();
        let mut updates = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some((k, v)) = self.counts.remove(&key) {
                updates.push((k, v));
            }
        }
        updates
    }

    fn drain_details(&self) -> Vec<ScanDetail> {
        let ids: Vec<u64> = self.details.iter().map(|r| *r.key()).collect();
        let mut details = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some((_, d)) = self.details.remove(&id) {
                details.push(d);
            }
        }
        details
    }

    /// 刷盘失败时恢复计数（详细日志直接丢弃，计数不能丢）
    fn restore_counts(&self, updates: Vec<(String, usize)>) {
        for (k, v) in updates {
            *self.counts.entry(k).or_insert(0) += v;
        }
    }
}

/// 扫码统计管理器
pub struct ScanManager {
    buffer: ScanBuffer,
    sink: Arc<dyn ScanSink>,
    detailed_sink: Option<Arc<dyn DetailedScanSink>>,
    flush_interval: Duration,
}

impl ScanManager {
    pub fn new(sink: Arc<dyn ScanSink>, flush_interval: Duration) -> Self {
        Self {
            buffer: ScanBuffer::new(),
            sink,
            detailed_sink: None,
            flush_interval,
        }
    }

    /// 启用详细扫码日志
    pub fn with_detailed_sink(mut self, sink: Arc<dyn DetailedScanSink>) -> Self {
        self.detailed_sink = Some(sink);
        self
    }

    pub fn is_detailed_logging_enabled(&self) -> bool {
        self.detailed_sink.is_some()
    }

    /// 增加扫码计数（线程安全，无锁）
    pub fn increment(&self, key: &str) {
        self.buffer.increment(key);
    }

    /// 记录一条详细扫码日志（未启用详细日志时静默丢弃）
    pub fn log_detail(&self, detail: ScanDetail) {
        if self.detailed_sink.is_some() {
            self.buffer.push_detail(detail);
        }
    }

    /// 启动后台刷盘任务（作为异步方法运行）
    pub async fn start_background_task(&self) {
        loop {
            sleep(self.flush_interval).await;

            debug!("ScanManager: Triggering flush to storage");
            self.flush_inner().await;
        }
    }

    /// 手动触发刷盘（测试与优雅停机用）
    pub async fn flush(&self) {
        debug!("ScanManager: Manual flush triggered");
        self.flush_inner().await;
    }

    async fn flush_inner(&self) {
        let Ok(_guard) = self.buffer.flush_lock.try_lock() else {
            debug!("ScanManager: flush already in progress, skipping");
            return;
        };

        let updates = self.buffer.drain_counts();
        if !updates.is_empty() {
            if let Err(e) = self.sink.flush_scans(updates.clone()).await {
                warn!("ScanManager: flush_scans failed, restoring counts: {}", e);
                self.buffer.restore_counts(updates);
            }
        }

        if let Some(detailed_sink) = &self.detailed_sink {
            let details = self.buffer.drain_details();
            if !details.is_empty() {
                let count = details.len();
                if let Err(e) = detailed_sink.log_scans_batch(details).await {
                    warn!("ScanManager: dropped {} scan logs: {}", count, e);
                }
            }
        }

        debug!("ScanManager: flush completed");
    }
}
