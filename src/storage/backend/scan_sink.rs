//! ScanManager 刷盘落库实现

use crate::analytics::{DetailedScanSink, ScanDetail, ScanSink};

use super::SeaOrmStorage;

#[async_trait::async_trait]
impl ScanSink for SeaOrmStorage {
    async fn flush_scans(&self, updates: Vec<(String, usize)>) -> anyhow::Result<()> {
        self.increment_scan_counts(&updates).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl DetailedScanSink for SeaOrmStorage {
    async fn log_scans_batch(&self, details: Vec<ScanDetail>) -> anyhow::Result<()> {
        self.insert_scan_logs(details).await?;
        Ok(())
    }
}
