//! # مدل ShortLink
//!
//! Entity اصلی: نگاشت یک URL بلند به یک کد کوتاه

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// =====================================
// ShortLink Entity
// =====================================
/// لینک کوتاه
///
/// # قیدها:
/// - `short_code` بین همه لینک‌ها یکتاست
/// - `original_url` هم یکتاست (اولین نویسنده برنده میشه)
/// - `click_count` فقط زیاد میشه، اونم از طریق صف کلیک‌ها
///
/// `Serialize/Deserialize` برای ذخیره در کش (Redis به صورت JSON) لازمه.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ShortLink {
    /// شناسه‌ای که دیتابیس میده
    pub id: i64,

    /// آدرس اصلی
    pub original_url: String,

    /// کد کوتاه (مثلا "aZ3k9Q")
    pub short_code: String,

    /// تاریخ ایجاد
    pub created_at: DateTime<Utc>,

    /// تاریخ آخرین بروزرسانی
    pub updated_at: DateTime<Utc>,

    /// تعداد کلیک
    pub click_count: i64,
}

impl ShortLink {
    /// گرفتن لینک کوتاه کامل
    #[must_use]
    pub fn short_url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.short_code)
    }
}

// =====================================
// NewShortLink
// =====================================
/// داده برای درج لینک جدید
///
/// شناسه رو دیتابیس تعیین میکنه، برای همین اینجا نیست.
#[derive(Debug, Clone)]
pub struct NewShortLink {
    pub original_url: String,
    pub short_code: String,
}

impl NewShortLink {
    #[must_use]
    pub fn new(original_url: impl Into<String>, short_code: impl Into<String>) -> Self {
        Self {
            original_url: original_url.into(),
            short_code: short_code.into(),
        }
    }
}
