//! # ماژول توابع کمکی (Utilities)
//!
//! - تولید کد کوتاه (Code Generator)
//! - اعتبارسنجی URL ورودی
//! - دسته‌بندی Referer و User-Agent برای آمار
//!
//! ## مفاهیم Rust:
//! - **const**: ثابت‌های compile-time
//! - **once_cell::Lazy**: مقداردهی اولیه تنبل برای Regex

use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;

use crate::error::{AppError, Result};

// =====================================
// Constants
// =====================================
/// الفبای کد کوتاه: ۶۲ نماد (عدد + حروف کوچک و بزرگ)
pub const SHORT_CODE_ALPHABET: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// طول پیش‌فرض short code
pub const DEFAULT_SHORT_CODE_LENGTH: usize = 6;

/// حداکثر طول hostname طبق DNS
pub const MAX_HOST_LENGTH: usize = 253;

// =====================================
// Short Code Generation
// =====================================
/// تولید short code تصادفی
///
/// هر کاراکتر مستقل و یکنواخت از الفبا انتخاب میشه.
/// احتمال تکرار صفر نیست؛ یکتا بودن رو `UrlService` تضمین میکنه.
///
/// # مثال
/// ```rust
/// use link_relay::utils::{generate_short_code, is_short_code_alphabet};
///
/// let code = generate_short_code(6);
/// assert_eq!(code.len(), 6);
/// assert!(is_short_code_alphabet(&code));
/// ```
#[must_use]
pub fn generate_short_code(length: usize) -> String {
    let mut rng = rand::thread_rng();

    (0..length)
        .map(|_| {
            let idx = rng.gen_range(0..SHORT_CODE_ALPHABET.len());
            SHORT_CODE_ALPHABET[idx] as char
        })
        .collect()
}

/// آیا همه کاراکترها از الفبای کد کوتاه هستن؟
#[must_use]
pub fn is_short_code_alphabet(code: &str) -> bool {
    code.bytes().all(|b| SHORT_CODE_ALPHABET.contains(&b))
}

// =====================================
// URL Validation
// =====================================
/// اعتبارسنجی URL اصلی
///
/// قوانین:
/// 1. بعد از trim خالی نباشه
/// 2. کاراکتر کنترلی (`\n`، `\r`، `\t`، ...) و فاصله اول/آخر نداشته باشه
/// 3. scheme فقط `http` یا `https`
/// 4. با `url` crate parse بشه
/// 5. host خالی نباشه و حداکثر ۲۵۳ کاراکتر
///
/// parser کاراکترهای کنترلی و فاصله‌های دو طرف رو بی‌صدا حذف میکنه، ولی
/// چیزی که ذخیره و redirect میشه رشته خام هست؛ پس اینجا رد میشن.
///
/// # Errors
/// `AppError::Validation` با پیام مناسب
pub fn validate_url(raw: &str) -> Result<()> {
    if raw.trim().is_empty() {
        return Err(AppError::Validation("URL cannot be empty".to_string()));
    }

    if raw.chars().any(char::is_control) {
        return Err(AppError::Validation(
            "URL must not contain control characters".to_string(),
        ));
    }

    if raw.trim() != raw {
        return Err(AppError::Validation(
            "URL must not have leading or trailing whitespace".to_string(),
        ));
    }

    if !raw.starts_with("http://") && !raw.starts_with("https://") {
        return Err(AppError::Validation(
            "URL must start with http:// or https://".to_string(),
        ));
    }

    let parsed = url::Url::parse(raw)
        .map_err(|e| AppError::Validation(format!("Invalid URL format: {}", e)))?;

    let host = parsed.host_str().unwrap_or_default();
    if host.is_empty() {
        return Err(AppError::Validation("URL must contain a hostname".to_string()));
    }

    if host.len() > MAX_HOST_LENGTH {
        return Err(AppError::Validation("Hostname is too long".to_string()));
    }

    Ok(())
}

// =====================================
// Referer Classification
// =====================================
/// دامنه ارجاع‌دهنده برای آمار
///
/// Referer خالی یعنی ورود مستقیم. اگه parse نشه خود رشته برمیگرده.
#[must_use]
pub fn referrer_domain(referer: &str) -> String {
    let referer = referer.trim();
    if referer.is_empty() {
        return "direct".to_string();
    }

    match url::Url::parse(referer) {
        Ok(url) => url
            .host_str()
            .map(|h| h.trim_start_matches("www.").to_string())
            .unwrap_or_else(|| referer.to_string()),
        Err(_) => referer.to_string(),
    }
}

// =====================================
// User-Agent Classification
// =====================================
/// الگوهای مرورگر به ترتیب اولویت
///
/// ترتیب مهمه: User-Agent کروم شامل "Safari" هم هست و Edge شامل "Chrome".
static BROWSER_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    [
        ("Edge", r"Edg(?:e|A|iOS)?/(\d+)"),
        ("Opera", r"(?:OPR|Opera)/(\d+)"),
        ("Firefox", r"(?:Firefox|FxiOS)/(\d+)"),
        ("Chrome", r"(?:Chrome|CriOS)/(\d+)"),
        ("Safari", r"Version/(\d+)[^ ]* (?:Mobile/\S+ )?Safari/"),
        ("curl", r"curl/(\d+)"),
    ]
    .into_iter()
    .map(|(name, pattern)| (name, Regex::new(pattern).expect("Invalid regex pattern")))
    .collect()
});

/// تشخیص نام و نسخه اصلی مرورگر از User-Agent
///
/// # مثال
/// ```rust
/// use link_relay::utils::parse_browser;
///
/// let ua = "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0";
/// assert_eq!(parse_browser(ua), ("Firefox".to_string(), "121".to_string()));
/// ```
#[must_use]
pub fn parse_browser(user_agent: &str) -> (String, String) {
    for (name, pattern) in BROWSER_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(user_agent) {
            let version = caps.get(1).map_or("", |m| m.as_str());
            return (name.to_string(), version.to_string());
        }
    }

    ("Other".to_string(), String::new())
}

/// فرمت درصد با یک رقم اعشار، مثلا "15.5%"
#[must_use]
pub fn format_percent(count: i64, total: i64) -> String {
    if total <= 0 {
        return "0%".to_string();
    }
    format!("{:.1}%", count as f64 * 100.0 / total as f64)
}

/// Mask کردن بخشی از متن (برای لاگ‌ها)
///
/// آدرس‌های IP توی لاگ کامل نوشته نمیشن.
///
/// # مثال
/// ```rust
/// use link_relay::utils::mask_string;
///
/// assert_eq!(mask_string("192.168.1.20", 4), "192.***");
/// ```
#[must_use]
pub fn mask_string(text: &str, visible_chars: usize) -> String {
    if text.len() <= visible_chars {
        return "*".repeat(text.len());
    }

    let visible: String = text.chars().take(visible_chars).collect();
    format!("{}***", visible)
}
