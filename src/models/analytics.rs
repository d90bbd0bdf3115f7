//! # مدل‌های آمار
//!
//! خروجی تجمیع کلیک‌ها برای یک لینک

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// آمار کلی یک لینک
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Analytics {
    /// تعداد کلیک‌ها در هفت روز اخیر
    pub total_clicks: i64,

    /// کلیک‌های هر روز (جدیدترین اول)
    pub daily_clicks: Vec<DailyClick>,

    /// منابع ورودی
    pub referrers: Vec<ReferrerStat>,

    /// مرورگرها
    pub browsers: Vec<BrowserStat>,
}

/// تعداد کلیک در یک روز
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct DailyClick {
    /// تاریخ به فرمت YYYY-MM-DD
    pub date: String,
    pub count: i64,
}

/// آمار یک دامنه ارجاع‌دهنده
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferrerStat {
    /// دامنه (مثلا google.com) یا "direct"
    pub referrer: String,
    pub count: i64,
    /// درصد از کل، مثلا "15.5%"
    pub percent: String,
}

/// آمار یک مرورگر
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserStat {
    pub browser: String,
    pub version: String,
    pub count: i64,
}
