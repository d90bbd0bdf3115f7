//! # سرویس URL (URL Resolver)
//!
//! تنها جایی که تصمیم‌های سازگاری گرفته میشه:
//! - dedup موقع ساخت (URL تکراری → همون رکورد قبلی)
//! - تولید کد با حداکثر ۱۰ تلاش
//! - cache-aside موقع خوندن
//!
//! ## قانون کش
//! کش best-effort هست. خطای کش موقع خوندن = miss، و خطای کش موقع نوشتن
//! فقط لاگ میشه. هیچ خطای کشی از این سرویس بیرون نمیره.

use std::sync::Arc;

use tracing::{debug, info, instrument, trace, warn};

use crate::{
    cache::LinkCache,
    database::LinkStore,
    error::{AppError, OptionExt, Result},
    models::{NewShortLink, ShortLink},
    utils,
};

/// حداکثر تعداد تلاش برای پیدا کردن کد آزاد
pub const MAX_CODE_ATTEMPTS: usize = 10;

// =====================================
// URL Service
// =====================================
/// سرویس ساخت و resolve لینک‌ها
///
/// # مفاهیم:
/// - `Arc<dyn Trait>`: dependency injection با trait object
/// - با `MockLinkStore` یا `NullCache` میشه جدا تستش کرد
#[derive(Clone)]
pub struct UrlService {
    store: Arc<dyn LinkStore>,
    cache: Arc<dyn LinkCache>,
    code_length: usize,
}

impl std::fmt::Debug for UrlService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlService")
            .field("cache", &self.cache.name())
            .field("code_length", &self.code_length)
            .finish()
    }
}

impl UrlService {
    /// ساخت سرویس جدید
    #[must_use]
    pub fn new(store: Arc<dyn LinkStore>, cache: Arc<dyn LinkCache>, code_length: usize) -> Self {
        Self {
            store,
            cache,
            code_length,
        }
    }

    /// ساخت لینک کوتاه
    ///
    /// # مراحل:
    /// 1. اعتبارسنجی URL
    /// 2. dedup: اگه این URL قبلا ثبت شده، همون برمیگرده (بدون نوشتن در کش)
    /// 3. تولید کد و چک تکراری نبودن، حداکثر `MAX_CODE_ATTEMPTS` بار
    /// 4. درج در دیتابیس، بعد نوشتن در کش
    ///
    /// اگه درج به قید یکتایی بخوره (رقابت با یک create همزمان)، دوباره با
    /// URL اصلی میگردیم: اگه برنده‌ای هست همون برمیگرده، وگرنه تکرار کد بوده
    /// و یک تلاش حساب میشه.
    ///
    /// # Errors
    /// - `Validation`: URL نامعتبر
    /// - `CodeExhaustion`: همه تلاش‌ها به کد تکراری خوردن
    /// - `Storage`: خطای دیتابیس
    #[instrument(skip(self))]
    pub async fn create_short_link(&self, original_url: &str) -> Result<ShortLink> {
        utils::validate_url(original_url)?;

        if let Some(existing) = self.store.find_by_original_url(original_url).await? {
            debug!(short_code = %existing.short_code, "URL already shortened, returning existing link");
            return Ok(existing);
        }

        for attempt in 1..=MAX_CODE_ATTEMPTS {
            let code = utils::generate_short_code(self.code_length);

            if self.store.find_by_code(&code).await?.is_some() {
                debug!(attempt, "Generated short code collides, retrying");
                continue;
            }

            match self
                .store
                .insert_short_link(&NewShortLink::new(original_url, code))
                .await
            {
                Ok(link) => {
                    self.prime_cache(&link).await;
                    info!(short_code = %link.short_code, id = link.id, "Created new short link");
                    return Ok(link);
                }
                Err(AppError::Conflict(_)) => {
                    if let Some(winner) = self.store.find_by_original_url(original_url).await? {
                        debug!(short_code = %winner.short_code, "Concurrent create won, returning its link");
                        return Ok(winner);
                    }
                    debug!(attempt, "Short code taken by a concurrent create, retrying");
                }
                Err(e) => return Err(e),
            }
        }

        warn!(attempts = MAX_CODE_ATTEMPTS, "Could not find a free short code");
        Err(AppError::CodeExhaustion {
            attempts: MAX_CODE_ATTEMPTS,
        })
    }

    /// resolve کد کوتاه به لینک (cache-aside)
    ///
    /// hit کش بلافاصله برمیگرده، حتی اگه `click_count` داخلش کهنه باشه.
    ///
    /// # Errors
    /// - `NotFound`: کد ناشناخته
    /// - `Storage`: خطای دیتابیس
    #[instrument(skip(self))]
    pub async fn resolve(&self, short_code: &str) -> Result<ShortLink> {
        match self.cache.get(short_code).await {
            Ok(Some(link)) => {
                trace!("Cache hit");
                return Ok(link);
            }
            Ok(None) => trace!("Cache miss"),
            Err(e) => warn!(error = %e, "Cache read failed, falling back to store"),
        }

        let link = self
            .store
            .find_by_code(short_code)
            .await?
            .ok_or_not_found(format!("Short code '{}' not found", short_code))?;

        self.prime_cache(&link).await;
        Ok(link)
    }

    /// حذف مدیریتی لینک و invalidate کردن کش
    ///
    /// # Errors
    /// - `NotFound`: کد ناشناخته
    #[instrument(skip(self))]
    pub async fn delete_short_link(&self, short_code: &str) -> Result<()> {
        if !self.store.delete_short_link(short_code).await? {
            return Err(AppError::link_not_found(short_code));
        }

        if let Err(e) = self.cache.delete(short_code).await {
            warn!(error = %e, "Failed to invalidate cache entry");
        }

        info!("Deleted short link");
        Ok(())
    }

    /// نوشتن best-effort در کش
    async fn prime_cache(&self, link: &ShortLink) {
        if let Err(e) = self.cache.set(link).await {
            warn!(short_code = %link.short_code, error = %e, "Failed to cache short link");
        }
    }
}

// =====================================
// Tests
// =====================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cache::{CacheError, CacheResult, MemoryCache, NullCache},
        database::MockLinkStore,
    };
    use async_trait::async_trait;
    use chrono::Utc;
    use std::time::Duration;

    /// کشی که همیشه خطا میده
    struct BrokenCache;

    #[async_trait]
    impl LinkCache for BrokenCache {
        async fn get(&self, _code: &str) -> CacheResult<Option<ShortLink>> {
            Err(CacheError::Backend("connection refused".to_string()))
        }

        async fn set(&self, _link: &ShortLink) -> CacheResult<()> {
            Err(CacheError::Backend("connection refused".to_string()))
        }

        async fn delete(&self, _code: &str) -> CacheResult<()> {
            Err(CacheError::Backend("connection refused".to_string()))
        }

        fn name(&self) -> &'static str {
            "broken"
        }
    }

    fn link(id: i64, url: &str, code: &str) -> ShortLink {
        let now = Utc::now();
        ShortLink {
            id,
            original_url: url.to_string(),
            short_code: code.to_string(),
            created_at: now,
            updated_at: now,
            click_count: 0,
        }
    }

    fn service(store: MockLinkStore, cache: Arc<dyn LinkCache>) -> UrlService {
        UrlService::new(Arc::new(store), cache, 6)
    }

    #[tokio::test]
    async fn test_exhaustion_after_ten_collisions() {
        let taken = link(1, "https://taken.example", "AAAAAA");

        let mut store = MockLinkStore::new();
        store.expect_find_by_original_url().returning(|_| Ok(None));
        store
            .expect_find_by_code()
            .times(MAX_CODE_ATTEMPTS)
            .returning(move |_| Ok(Some(taken.clone())));
        store.expect_insert_short_link().never();

        let svc = service(store, Arc::new(NullCache::new()));
        let result = svc.create_short_link("https://example.com/page").await;

        assert!(matches!(
            result,
            Err(AppError::CodeExhaustion { attempts: MAX_CODE_ATTEMPTS })
        ));
    }

    #[tokio::test]
    async fn test_existing_url_is_returned_without_cache_write() {
        let existing = link(3, "https://example.com/page", "abc123");
        let returned = existing.clone();

        let mut store = MockLinkStore::new();
        store
            .expect_find_by_original_url()
            .times(1)
            .returning(move |_| Ok(Some(returned.clone())));
        store.expect_find_by_code().never();
        store.expect_insert_short_link().never();

        let cache = Arc::new(MemoryCache::new(100, Duration::from_secs(60)));
        let svc = service(store, cache.clone());

        let result = svc.create_short_link("https://example.com/page").await.unwrap();
        assert_eq!(result, existing);
        assert!(cache.get("abc123").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_created_link_primes_cache() {
        let mut store = MockLinkStore::new();
        store.expect_find_by_original_url().returning(|_| Ok(None));
        store.expect_find_by_code().times(1).returning(|_| Ok(None));
        store
            .expect_insert_short_link()
            .times(1)
            .returning(|new| Ok(link(9, &new.original_url, &new.short_code)));

        let cache = Arc::new(MemoryCache::new(100, Duration::from_secs(60)));
        let svc = service(store, cache.clone());

        let created = svc.create_short_link("https://example.com/page").await.unwrap();
        assert_eq!(created.short_code.len(), 6);
        assert!(utils::is_short_code_alphabet(&created.short_code));

        let cached = cache.get(&created.short_code).await.unwrap();
        assert_eq!(cached, Some(created));
    }

    #[tokio::test]
    async fn test_cache_write_failure_does_not_fail_create() {
        let mut store = MockLinkStore::new();
        store.expect_find_by_original_url().returning(|_| Ok(None));
        store.expect_find_by_code().returning(|_| Ok(None));
        store
            .expect_insert_short_link()
            .returning(|new| Ok(link(1, &new.original_url, &new.short_code)));

        let svc = service(store, Arc::new(BrokenCache));
        assert!(svc.create_short_link("https://example.com").await.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_url_never_touches_store() {
        let mut store = MockLinkStore::new();
        store.expect_find_by_original_url().never();

        let svc = service(store, Arc::new(NullCache::new()));
        let result = svc.create_short_link("not-a-url").await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_store_error_on_create_propagates() {
        let mut store = MockLinkStore::new();
        store
            .expect_find_by_original_url()
            .returning(|_| Err(AppError::Storage(sqlx::Error::PoolTimedOut)));

        let svc = service(store, Arc::new(NullCache::new()));
        let result = svc.create_short_link("https://example.com").await;
        assert!(matches!(result, Err(AppError::Storage(_))));
    }

    #[tokio::test]
    async fn test_conflict_returns_concurrent_winner() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let winner = link(5, "https://example.com", "WINNER");
        let winner_clone = winner.clone();
        let lookups = Arc::new(AtomicUsize::new(0));
        let counter = lookups.clone();

        let mut store = MockLinkStore::new();
        // بار اول: هنوز کسی ثبت نکرده؛ بار دوم: برنده create همزمان
        store.expect_find_by_original_url().times(2).returning(move |_| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Ok(None)
            } else {
                Ok(Some(winner_clone.clone()))
            }
        });
        store.expect_find_by_code().returning(|_| Ok(None));
        store
            .expect_insert_short_link()
            .times(1)
            .returning(|_| Err(AppError::Conflict("short link already exists".to_string())));

        let svc = service(store, Arc::new(NullCache::new()));
        let result = svc.create_short_link("https://example.com").await.unwrap();
        assert_eq!(result, winner);
        assert_eq!(lookups.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_conflict_without_winner_counts_as_attempt() {
        let mut store = MockLinkStore::new();
        store.expect_find_by_original_url().returning(|_| Ok(None));
        store.expect_find_by_code().returning(|_| Ok(None));
        store
            .expect_insert_short_link()
            .times(MAX_CODE_ATTEMPTS)
            .returning(|_| Err(AppError::Conflict("short link already exists".to_string())));

        let svc = service(store, Arc::new(NullCache::new()));
        let result = svc.create_short_link("https://example.com").await;
        assert!(matches!(result, Err(AppError::CodeExhaustion { .. })));
    }

    #[tokio::test]
    async fn test_resolve_cache_hit_skips_store() {
        let cached = link(1, "https://example.com", "abc123");

        let mut store = MockLinkStore::new();
        store.expect_find_by_code().never();

        let cache = Arc::new(MemoryCache::new(100, Duration::from_secs(60)));
        cache.set(&cached).await.unwrap();

        let svc = service(store, cache);
        assert_eq!(svc.resolve("abc123").await.unwrap(), cached);
    }

    #[tokio::test]
    async fn test_resolve_miss_reads_store_and_reprimes_cache() {
        let stored = link(1, "https://example.com", "abc123");
        let returned = stored.clone();

        let mut store = MockLinkStore::new();
        store
            .expect_find_by_code()
            .times(1)
            .returning(move |_| Ok(Some(returned.clone())));

        let cache = Arc::new(MemoryCache::new(100, Duration::from_secs(60)));
        let svc = service(store, cache.clone());

        assert_eq!(svc.resolve("abc123").await.unwrap(), stored);
        // بار دوم از کش میاد؛ times(1) بالا اینو چک میکنه
        assert_eq!(svc.resolve("abc123").await.unwrap(), stored);
    }

    #[tokio::test]
    async fn test_resolve_with_broken_cache_falls_back_to_store() {
        let stored = link(1, "https://example.com", "abc123");
        let returned = stored.clone();

        let mut store = MockLinkStore::new();
        store
            .expect_find_by_code()
            .returning(move |_| Ok(Some(returned.clone())));

        let svc = service(store, Arc::new(BrokenCache));
        assert_eq!(svc.resolve("abc123").await.unwrap(), stored);
    }

    #[tokio::test]
    async fn test_resolve_unknown_code_is_not_found() {
        let mut store = MockLinkStore::new();
        store.expect_find_by_code().returning(|_| Ok(None));

        let svc = service(store, Arc::new(NullCache::new()));
        assert!(matches!(
            svc.resolve("zzzzzz").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_invalidates_cache() {
        let cached = link(1, "https://example.com", "abc123");

        let mut store = MockLinkStore::new();
        store
            .expect_delete_short_link()
            .times(1)
            .returning(|_| Ok(true));

        let cache = Arc::new(MemoryCache::new(100, Duration::from_secs(60)));
        cache.set(&cached).await.unwrap();

        let svc = service(store, cache.clone());
        svc.delete_short_link("abc123").await.unwrap();
        assert!(cache.get("abc123").await.unwrap().is_none());
    }
}
