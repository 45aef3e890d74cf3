use std::sync::{Arc, OnceLock};
use tracing::trace;

use super::manager::ScanManager;

pub static GLOBAL_SCAN_MANAGER: OnceLock<Arc<ScanManager>> = OnceLock::new();

/// 初始化全局扫码管理器（只允许初始化一次）
pub fn set_global_scan_manager(manager: Arc<ScanManager>) {
    if GLOBAL_SCAN_MANAGER.set(manager).is_err() {
        panic!("GLOBAL_SCAN_MANAGER has already been set");
    }
}

/// 获取全局扫码管理器
pub fn get_scan_manager() -> Option<&'static Arc<ScanManager>> {
    match GLOBAL_SCAN_MANAGER.get() {
        Some(manager) => Some(manager),
        None => {
            trace!("GLOBAL_SCAN_MANAGER has not been initialized yet");
            None
        }
    }
}
