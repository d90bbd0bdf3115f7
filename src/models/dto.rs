//! # Data Transfer Objects (DTOs)
//!
//! DTO‌هایی که در API استفاده میشن
//!
//! ## مفاهیم:
//! - Request/Response separation: جداسازی ورودی از خروجی
//! - `#[derive(Validate)]`: اعتبارسنجی اولیه شکل درخواست
//!   (قوانین اصلی URL در `utils::validate_url` هستن)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::ShortLink;

// =====================================
// Requests
// =====================================
/// درخواست ساخت لینک کوتاه
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateShortLinkRequest {
    /// آدرس اصلی
    #[validate(length(min = 1, max = 2048, message = "URL length must be between 1 and 2048"))]
    pub url: String,
}

// =====================================
// Generic API Responses
// =====================================
/// پاسخ موفق عمومی
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    /// ساخت پاسخ موفق
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

// =====================================
// ShortLink Response
// =====================================
/// اطلاعات لینک که به کلاینت برمیگرده
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortLinkResponse {
    pub short_code: String,
    pub short_url: String,
    pub original_url: String,
    pub click_count: i64,
    pub created_at: DateTime<Utc>,
}

impl ShortLinkResponse {
    /// تبدیل از entity
    ///
    /// base_url برای ساخت لینک کامل لازمه
    #[must_use]
    pub fn from_link(link: &ShortLink, base_url: &str) -> Self {
        Self {
            short_code: link.short_code.clone(),
            short_url: link.short_url(base_url),
            original_url: link.original_url.clone(),
            click_count: link.click_count,
            created_at: link.created_at,
        }
    }
}

// =====================================
// Health Check
// =====================================
/// پاسخ health check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: bool,
    /// تعداد رویدادهای کلیک منتظر در صف
    pub pending_clicks: usize,
}

impl HealthResponse {
    #[must_use]
    pub fn new(database_ok: bool, pending_clicks: usize) -> Self {
        Self {
            status: if database_ok { "healthy" } else { "degraded" }.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            database: database_ok,
            pending_clicks,
        }
    }
}
