//! Adaptive QRC 核心
//!
//! 一个自适应短链（Adaptive QRC）挂载多个内容槽（Slot），
//! 按日期/时间规则或首扫/回访分类在扫码时选择其一：
//! - `model`: 领域模型（Slot / DateRule / FirstReturnRule / AdaptiveQrc）
//! - `time_window`: HH:MM 时间窗与星期匹配（含跨午夜窗口）
//! - `resolver`: 解析引擎，纯函数决策 + 单次访客记录写入

pub mod model;
pub mod resolver;
pub mod time_window;

pub use model::{AdaptiveQrc, DateRule, FirstReturnRule, MatchedRule, Resolution, Slot};
pub use resolver::Resolver;
