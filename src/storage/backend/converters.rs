//! 数据库行与领域模型互转
//!
//! slots / date_rules / first_return 列存 JSON 文本。
//! 读方向对坏数据宽容：时区解析失败回退 UTC，
//! 坏 JSON 作为操作错误上抛（行本身已不可服务）。

use chrono_tz::Tz;
use sea_orm::Set;
use tracing::warn;

use crate::adaptive::model::{AdaptiveQrc, DateRule, FirstReturnRule, Slot};
use crate::errors::{QrlinkerError, Result};

use migration::entities::adaptive_qrc;

pub fn model_to_qrc(model: adaptive_qrc::Model) -> Result<AdaptiveQrc> {
    let slots: Vec<Slot> = serde_json::from_str(&model.slots).map_err(|e| {
        QrlinkerError::serialization(format!("链接 {} 的 slots 列损坏: {}", model.code, e))
    })?;
    let date_rules: Vec<DateRule> = serde_json::from_str(&model.date_rules).map_err(|e| {
        QrlinkerError::serialization(format!("链接 {} 的 date_rules 列损坏: {}", model.code, e))
    })?;
    let first_return: Option<FirstReturnRule> = model
        .first_return
        .as_deref()
        .map(serde_json::from_str)
        .transpose()
        .map_err(|e| {
            QrlinkerError::serialization(format!("链接 {} 的 first_return 列损坏: {}", model.code, e))
        })?;

    let timezone: Tz = match model.timezone.parse() {
        Ok(tz) => tz,
        Err(_) => {
            // 坏时区不能让链接不可服务
            warn!(
                "Link {} has invalid timezone '{}', falling back to UTC",
                model.code, model.timezone
            );
            chrono_tz::UTC
        }
    };

    Ok(AdaptiveQrc {
        id: model.id,
        code: model.code,
        owner: model.owner,
        slots,
        date_rules,
        first_return,
        default_slot: model.default_slot,
        timezone,
        scan_count: model.scan_count,
        scan_limit: model.scan_limit,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

pub fn qrc_to_active_model(link: &AdaptiveQrc) -> Result<adaptive_qrc::ActiveModel> {
    let first_return = link
        .first_return
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;

    Ok(adaptive_qrc::ActiveModel {
        id: Set(link.id.clone()),
        code: Set(link.code.clone()),
        owner: Set(link.owner.clone()),
        slots: Set(serde_json::to_string(&link.slots)?),
        date_rules: Set(serde_json::to_string(&link.date_rules)?),
        first_return: Set(first_return),
        default_slot: Set(link.default_slot.clone()),
        timezone: Set(link.timezone.name().to_string()),
        scan_count: Set(link.scan_count),
        scan_limit: Set(link.scan_limit),
        created_at: Set(link.created_at),
        updated_at: Set(link.updated_at),
    })
}
