//! # ماژول کش (Resolution Cache)
//!
//! یک لایه cache-aside جلوی دیتابیس، با کلید کد کوتاه.
//!
//! ## پیاده‌سازی‌ها:
//! - `MemoryCache`: درون‌حافظه‌ای با moka و TTL ثابت
//! - `RedisCache`: کش مشترک روی Redis با `SET EX`
//! - `NullCache`: کش غایب - همیشه miss
//!
//! هر سه از `LinkCache` پیروی میکنن، پس منطق `UrlService` با کش یا بدون کش
//! یکسانه. کش هیچوقت منبع حقیقت نیست: `click_count` داخلش ممکنه کهنه باشه.

mod memory;
mod null;
mod redis;

pub use memory::MemoryCache;
pub use null::NullCache;
pub use self::redis::RedisCache;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::{
    config::{CacheBackend, Config},
    models::ShortLink,
};

/// نتیجه عملیات کش
pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// خطای کش
///
/// این نوع عمدا از `AppError` جداست تا Resolver مجبور باشه
/// صریحا تصمیم بگیره باهاش چیکار کنه (یعنی: مثل miss رفتار کنه).
#[derive(Debug, Error)]
pub enum CacheError {
    /// خطای backend (اتصال، timeout، ...)
    #[error("cache backend error: {0}")]
    Backend(String),

    /// مقدار ذخیره شده قابل خوندن نیست
    #[error("cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<::redis::RedisError> for CacheError {
    fn from(err: ::redis::RedisError) -> Self {
        CacheError::Backend(err.to_string())
    }
}

// =====================================
// Cache Trait
// =====================================
/// قرارداد کش لینک‌ها
///
/// همه عملیات idempotent هستن و به جز خود store اثر جانبی ندارن.
#[async_trait]
pub trait LinkCache: Send + Sync {
    /// گرفتن لینک با کد کوتاه؛ `Ok(None)` یعنی miss
    async fn get(&self, code: &str) -> CacheResult<Option<ShortLink>>;

    /// ذخیره یا بازنویسی لینک (کلید = `short_code`)
    async fn set(&self, link: &ShortLink) -> CacheResult<()>;

    /// حذف کلید؛ نبودن کلید خطا نیست
    async fn delete(&self, code: &str) -> CacheResult<()>;

    /// اسم backend برای لاگ
    fn name(&self) -> &'static str;
}

/// ساخت کش بر اساس تنظیمات
///
/// # Errors
/// فقط برای Redis، اگه اتصال اولیه برقرار نشه
pub async fn build_cache(config: &Config) -> CacheResult<Arc<dyn LinkCache>> {
    let cache: Arc<dyn LinkCache> = match config.cache_backend {
        CacheBackend::Memory => Arc::new(MemoryCache::new(
            config.cache_max_entries,
            config.cache_ttl(),
        )),
        CacheBackend::Redis => {
            Arc::new(RedisCache::connect(&config.redis_url, config.cache_ttl()).await?)
        }
        CacheBackend::None => Arc::new(NullCache::new()),
    };

    info!(backend = cache.name(), ttl_secs = config.cache_ttl_secs, "Resolution cache ready");
    Ok(cache)
}
