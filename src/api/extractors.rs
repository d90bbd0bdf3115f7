//! # Custom Extractors
//!
//! Extractor‌های سفارشی برای استخراج داده از request
//!
//! ## مفاهیم Rust + Axum:
//! - **Extractors**: نوع‌هایی که از request داده استخراج میکنن
//! - **FromRequestParts**: برای header‌ها و extension‌ها
//! - **FromRequest**: برای body (فقط آخرین پارامتر handler)
//! - **Rejection**: نوع خطا برای extractors

use std::net::SocketAddr;

use axum::{
    async_trait,
    body::Body,
    extract::{rejection::JsonRejection, ConnectInfo, FromRequest, FromRequestParts},
    http::{header, request::Parts, HeaderMap, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::AppError;

// =====================================
// Client Info Extractor
// =====================================
/// اطلاعات کلاینت برای ثبت کلیک
///
/// # منابع:
/// - IP: اولین hop در `X-Forwarded-For`، وگرنه آدرس اتصال
/// - `User-Agent` و `Referer`: اگه نباشن رشته خالی
///
/// هیچوقت reject نمیکنه.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    pub ip_address: String,
    pub user_agent: String,
    pub referer: String,
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for ClientInfo {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string());

        let ip_address = forwarded_for(&parts.headers)
            .or(peer)
            .unwrap_or_else(|| "unknown".to_string());

        Ok(ClientInfo {
            ip_address,
            user_agent: header_string(&parts.headers, header::USER_AGENT),
            referer: header_string(&parts.headers, header::REFERER),
        })
    }
}

/// اولین آدرس در `X-Forwarded-For` (کلاینت اصلی پشت proxy)
fn forwarded_for(headers: &HeaderMap) -> Option<String> {
    headers
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

fn header_string(headers: &HeaderMap, name: header::HeaderName) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

// =====================================
// JSON with Validation
// =====================================
/// استخراج JSON با اعتبارسنجی خودکار
///
/// بدنه خراب یا ناقص هم مثل ورودی نامعتبر `400` میگیره.
///
/// # استفاده:
/// ```rust,ignore
/// async fn handler(ValidatedJson(data): ValidatedJson<CreateShortLinkRequest>) -> ... {
///     // data حتما valid هست
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request(req: Request<Body>, state: &S) -> Result<Self, Self::Rejection> {
        let Json(data): Json<T> = Json::from_request(req, state)
            .await
            .map_err(|e: JsonRejection| AppError::Validation(format!("Invalid JSON: {}", e)))?;

        data.validate()?;

        Ok(ValidatedJson(data))
    }
}
