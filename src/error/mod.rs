//! # ماژول مدیریت خطاها (Error Handling)
//!
//! این ماژول سیستم مدیریت خطای برنامه رو تعریف میکنه.
//!
//! ## دسته‌بندی خطاها
//!
//! - `Validation`: URL ورودی خراب - کاربر باید درستش کنه
//! - `CodeExhaustion`: بعد از ۱۰ تلاش کد آزاد پیدا نشد - خطای سمت سرور
//! - `NotFound`: کد کوتاه ناشناخته
//! - `Storage`: خطای گذرای دیتابیس - به caller برمیگرده
//!
//! خطاهای کش اینجا نیستن! Resolver اون‌ها رو مثل cache miss میبینه و
//! هیچوقت به caller نمیرسن (به جز موقع راه‌اندازی، از طریق `Cache`).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

use crate::cache::CacheError;

// =====================================
// Result Type Alias
// =====================================
/// نوع Result سفارشی برنامه
///
/// به جای نوشتن `Result<ShortLink, AppError>` میتونیم بنویسیم `Result<ShortLink>`
pub type Result<T, E = AppError> = std::result::Result<T, E>;

// =====================================
// Custom Error Enum
// =====================================
/// خطای اصلی برنامه
///
/// # مفاهیم:
/// - `#[derive(Error)]`: از thiserror برای پیاده‌سازی Error trait
/// - `#[from]`: تبدیل خودکار از نوع‌های دیگه با `?`
#[derive(Debug, Error)]
pub enum AppError {
    // ----------------------------------------
    // خطاهای کاربر (4xx)
    // ----------------------------------------

    /// URL نامعتبر - 400
    #[error("Validation error: {0}")]
    Validation(String),

    /// پیدا نشد - 404
    #[error("Not found: {0}")]
    NotFound(String),

    /// نقض قید یکتایی در دیتابیس - 409
    #[error("Conflict: {0}")]
    Conflict(String),

    // ----------------------------------------
    // خطاهای سرور (5xx)
    // ----------------------------------------

    /// همه کدهای تولید شده تکراری بودن
    #[error("Failed to generate a unique short code after {attempts} attempts")]
    CodeExhaustion { attempts: usize },

    /// خطای داخلی سرور - 500
    #[error("Internal server error: {0}")]
    Internal(String),

    /// خطای سرور HTTP
    #[error("Server error: {0}")]
    Server(String),

    /// خطای تنظیمات
    #[error("Configuration error: {0}")]
    Config(String),

    // ----------------------------------------
    // خطاهای تبدیل شده از کتابخانه‌ها
    // ----------------------------------------

    /// خطای گذرای ذخیره‌سازی
    /// `#[from]` یعنی sqlx::Error خودکار به این تبدیل میشه
    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    /// خطای اجرای migration
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// خطای اتصال به کش (فقط موقع راه‌اندازی)
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// خطای IO
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// خطای JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    /// گرفتن HTTP status code متناسب با خطا
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 4xx Client Errors
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,

            // 5xx Server Errors
            Self::CodeExhaustion { .. }
            | Self::Internal(_)
            | Self::Server(_)
            | Self::Config(_)
            | Self::Storage(_)
            | Self::Migration(_)
            | Self::Cache(_)
            | Self::Io(_)
            | Self::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// آیا این یه خطای سرور هست؟
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// ساخت خطای Not Found برای کد کوتاه
    #[must_use]
    pub fn link_not_found(short_code: &str) -> Self {
        Self::NotFound(format!("Short code '{}' not found", short_code))
    }
}

// =====================================
// Error Response DTO
// =====================================
/// ساختار پاسخ خطا در API
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// کد خطا (مثلا "Not Found")
    pub error: String,

    /// پیام خطا
    pub message: String,

    /// کد وضعیت HTTP
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

impl ErrorResponse {
    /// ساخت پاسخ خطای جدید
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status_code: None,
        }
    }

    /// اضافه کردن کد وضعیت
    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status_code = Some(status.as_u16());
        self
    }
}

// =====================================
// IntoResponse Implementation
// =====================================
/// تبدیل AppError به Response HTTP
///
/// این باعث میشه بتونیم AppError رو مستقیم از handler برگردونیم
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // لاگ کردن خطاهای سرور
        if self.is_server_error() {
            error!(error = %self, "Server error occurred");
        }

        let status = self.status_code();

        // جزئیات خطاهای ذخیره‌سازی به کلاینت نشون داده نمیشه
        let message = match &self {
            Self::Storage(_) | Self::Migration(_) | Self::Cache(_) | Self::Io(_) => {
                "Internal storage failure".to_string()
            }
            other => other.to_string(),
        };

        let error_response =
            ErrorResponse::new(status.canonical_reason().unwrap_or("Error"), message)
                .with_status(status);

        (status, Json(error_response)).into_response()
    }
}

// تبدیل validator error
impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}

// =====================================
// Option Extensions
// =====================================
/// Extension trait برای Option
pub trait OptionExt<T> {
    /// تبدیل None به AppError::NotFound
    fn ok_or_not_found(self, message: impl Into<String>) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self, message: impl Into<String>) -> Result<T> {
        self.ok_or_else(|| AppError::NotFound(message.into()))
    }
}
