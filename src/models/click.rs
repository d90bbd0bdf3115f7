//! # مدل ClickEvent
//!
//! هر redirect یک رویداد کلیک میسازه. رویداد مالکیت لینک رو نداره،
//! فقط به شناسه‌ش اشاره میکنه.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// رویداد کلیک
///
/// # چرخه عمر:
/// 1. موقع redirect ساخته میشه
/// 2. تا وقتی ثبت نشده، مال صف کلیک‌هاست (`ClickPipeline`)
/// 3. بعد از ثبت در دیتابیس یا دور انداخته شدن، تموم میشه
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickEvent {
    /// شناسه لینک صاحب کلیک
    pub short_link_id: i64,

    /// IP کلاینت
    pub ip_address: String,

    /// User-Agent مرورگر
    pub user_agent: String,

    /// Referer (اگه نباشه رشته خالی)
    pub referer: String,

    /// زمان کلیک
    pub created_at: DateTime<Utc>,
}

impl ClickEvent {
    /// ساخت رویداد با زمان فعلی
    #[must_use]
    pub fn new(
        short_link_id: i64,
        ip_address: impl Into<String>,
        user_agent: impl Into<String>,
        referer: impl Into<String>,
    ) -> Self {
        Self {
            short_link_id,
            ip_address: ip_address.into(),
            user_agent: user_agent.into(),
            referer: referer.into(),
            created_at: Utc::now(),
        }
    }
}
