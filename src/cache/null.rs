//! کش غایب
//!
//! وقتی کش خاموشه (`CACHE_BACKEND=none`) استفاده میشه. همه عملیات
//! بلافاصله موفق میشن و `get` همیشه miss برمیگردونه.

use async_trait::async_trait;
use tracing::debug;

use super::{CacheResult, LinkCache};
use crate::models::ShortLink;

#[derive(Debug, Clone, Copy)]
pub struct NullCache;

impl NullCache {
    #[must_use]
    pub fn new() -> Self {
        debug!("Using NullCache (caching disabled)");
        Self
    }
}

impl Default for NullCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LinkCache for NullCache {
    async fn get(&self, _code: &str) -> CacheResult<Option<ShortLink>> {
        Ok(None)
    }

    async fn set(&self, _link: &ShortLink) -> CacheResult<()> {
        Ok(())
    }

    async fn delete(&self, _code: &str) -> CacheResult<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "none"
    }
}
