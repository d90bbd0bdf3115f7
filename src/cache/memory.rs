//! کش درون‌حافظه‌ای با moka
//!
//! برای استقرار تک‌نودی مناسبه. expiry کاملا passive هست: moka خودش
//! entry‌های منقضی رو موقع خوندن نادیده میگیره.

use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use tracing::trace;

use super::{CacheResult, LinkCache};
use crate::models::ShortLink;

#[derive(Debug, Clone)]
pub struct MemoryCache {
    cache: Cache<String, ShortLink>,
}

impl MemoryCache {
    /// ساخت کش با ظرفیت و TTL ثابت برای هر entry
    #[must_use]
    pub fn new(max_capacity: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(ttl)
            .build();
        Self { cache }
    }
}

#[async_trait]
impl LinkCache for MemoryCache {
    async fn get(&self, code: &str) -> CacheResult<Option<ShortLink>> {
        let hit = self.cache.get(code).await;
        trace!(code, hit = hit.is_some(), "Memory cache lookup");
        Ok(hit)
    }

    async fn set(&self, link: &ShortLink) -> CacheResult<()> {
        self.cache.insert(link.short_code.clone(), link.clone()).await;
        Ok(())
    }

    async fn delete(&self, code: &str) -> CacheResult<()> {
        self.cache.invalidate(code).await;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
