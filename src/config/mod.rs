//! # ماژول تنظیمات (Configuration)
//!
//! این ماژول مسئول خوندن و مدیریت تنظیمات برنامه هست.
//!
//! ## مفاهیم Rust:
//! - **Derive Macros**: تولید خودکار کد با `#[derive(...)]`
//! - **Default Trait**: مقادیر پیش‌فرض
//! - **Builder Pattern**: ساخت تدریجی آبجکت (برای تست‌ها خیلی به درد میخوره)

use std::{env, time::Duration};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// تنظیمات اصلی برنامه
///
/// # مثال
/// ```rust
/// use link_relay::config::Config;
///
/// let config = Config::default();
/// assert_eq!(config.click_queue_capacity, 1000);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// آدرس هاست سرور
    pub host: String,

    /// پورت سرور
    pub port: u16,

    /// آدرس پایه برای لینک‌های کوتاه
    pub base_url: String,

    /// آدرس اتصال به دیتابیس
    pub database_url: String,

    /// نوع کش
    pub cache_backend: CacheBackend,

    /// آدرس Redis (فقط وقتی cache_backend = redis)
    pub redis_url: String,

    /// عمر هر entry کش (ثانیه)
    pub cache_ttl_secs: u64,

    /// حداکثر تعداد entry در کش حافظه
    pub cache_max_entries: u64,

    /// طول کد کوتاه تولیدی
    pub short_code_length: usize,

    /// ظرفیت صف کلیک‌ها
    pub click_queue_capacity: usize,

    /// تعداد worker‌های ثبت کلیک
    pub click_workers: usize,

    /// سقف زمان خاموش شدن (ثانیه)
    pub shutdown_timeout_secs: u64,

    /// محیط اجرا (development, production)
    pub environment: Environment,
}

/// محیط اجرای برنامه
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// محیط توسعه - با قابلیت‌های دیباگ
    #[default]
    Development,

    /// محیط تست
    Testing,

    /// محیط تولید
    Production,
}

impl Environment {
    /// آیا در محیط تولید هستیم؟
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl From<String> for Environment {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            "testing" | "test" => Environment::Testing,
            _ => Environment::Development,
        }
    }
}

/// کدوم پیاده‌سازی کش جلوی دیتابیس بشینه
///
/// `None` همون کش غایب هست: Resolver همون منطق رو اجرا میکنه
/// ولی هر get یک miss برمیگردونه.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// کش درون‌حافظه‌ای (moka)
    #[default]
    Memory,

    /// کش مشترک روی Redis
    Redis,

    /// بدون کش
    None,
}

impl From<String> for CacheBackend {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "redis" => CacheBackend::Redis,
            "none" | "off" | "disabled" => CacheBackend::None,
            _ => CacheBackend::Memory,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            base_url: "http://localhost:8080".to_string(),
            database_url: "sqlite://data/links.db?mode=rwc".to_string(),
            cache_backend: CacheBackend::Memory,
            redis_url: "redis://127.0.0.1:6379".to_string(),
            cache_ttl_secs: 3600,
            cache_max_entries: 10_000,
            short_code_length: 6,
            click_queue_capacity: 1000,
            click_workers: 5,
            shutdown_timeout_secs: 30,
            environment: Environment::Development,
        }
    }
}

impl Config {
    /// ساخت تنظیمات از متغیرهای محیطی
    ///
    /// هر کلید مقدار پیش‌فرض داره، پس این تابع فقط وقتی fail میشه
    /// که نتیجه نهایی از `validate` رد بشه.
    ///
    /// # Errors
    /// `AppError::Config` اگه تنظیمات نامعتبر باشن
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let get_env = |key: &str, default: &str| -> String {
            env::var(key).unwrap_or_else(|_| default.to_string())
        };

        // helper برای parse کردن عدد
        fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
            env::var(key)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        }

        let config = Self {
            host: get_env("HOST", &defaults.host),
            port: parse_env("PORT", defaults.port),
            base_url: get_env("BASE_URL", &defaults.base_url),
            database_url: get_env("DATABASE_URL", &defaults.database_url),
            cache_backend: get_env("CACHE_BACKEND", "memory").into(),
            redis_url: get_env("REDIS_URL", &defaults.redis_url),
            cache_ttl_secs: parse_env("CACHE_TTL_SECS", defaults.cache_ttl_secs),
            cache_max_entries: parse_env("CACHE_MAX_ENTRIES", defaults.cache_max_entries),
            short_code_length: parse_env("SHORT_CODE_LENGTH", defaults.short_code_length),
            click_queue_capacity: parse_env("CLICK_QUEUE_CAPACITY", defaults.click_queue_capacity),
            click_workers: parse_env("CLICK_WORKERS", defaults.click_workers),
            shutdown_timeout_secs: parse_env("SHUTDOWN_TIMEOUT_SECS", defaults.shutdown_timeout_secs),
            environment: get_env("ENVIRONMENT", "development").into(),
        };

        config.validate()?;
        Ok(config)
    }

    /// اعتبارسنجی تنظیمات
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(AppError::Config("PORT cannot be 0".to_string()));
        }

        if self.short_code_length == 0 {
            return Err(AppError::Config("SHORT_CODE_LENGTH must be positive".to_string()));
        }

        if self.click_workers == 0 {
            return Err(AppError::Config("CLICK_WORKERS must be positive".to_string()));
        }

        // tokio::sync::mpsc با ظرفیت صفر panic میکنه
        if self.click_queue_capacity == 0 {
            return Err(AppError::Config("CLICK_QUEUE_CAPACITY must be positive".to_string()));
        }

        if self.cache_ttl_secs == 0 {
            return Err(AppError::Config("CACHE_TTL_SECS must be positive".to_string()));
        }

        Ok(())
    }

    /// آدرس کامل سرور
    #[must_use]
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

// =====================================
// Builder Pattern
// =====================================
/// ساخت Config با Builder Pattern
///
/// # مثال
/// ```rust
/// use link_relay::config::{CacheBackend, ConfigBuilder};
///
/// let config = ConfigBuilder::new()
///     .port(9090)
///     .cache_backend(CacheBackend::None)
///     .build();
/// assert_eq!(config.port, 9090);
/// ```
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// ساخت builder جدید
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    #[must_use]
    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.config.database_url = url.into();
        self
    }

    #[must_use]
    pub fn cache_backend(mut self, backend: CacheBackend) -> Self {
        self.config.cache_backend = backend;
        self
    }

    #[must_use]
    pub fn redis_url(mut self, url: impl Into<String>) -> Self {
        self.config.redis_url = url.into();
        self
    }

    #[must_use]
    pub fn cache_ttl_secs(mut self, secs: u64) -> Self {
        self.config.cache_ttl_secs = secs;
        self
    }

    #[must_use]
    pub fn short_code_length(mut self, length: usize) -> Self {
        self.config.short_code_length = length;
        self
    }

    #[must_use]
    pub fn click_queue_capacity(mut self, capacity: usize) -> Self {
        self.config.click_queue_capacity = capacity;
        self
    }

    #[must_use]
    pub fn click_workers(mut self, workers: usize) -> Self {
        self.config.click_workers = workers;
        self
    }

    #[must_use]
    pub fn shutdown_timeout_secs(mut self, secs: u64) -> Self {
        self.config.shutdown_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn environment(mut self, env: Environment) -> Self {
        self.config.environment = env;
        self
    }

    /// ساخت Config نهایی
    #[must_use]
    pub fn build(self) -> Config {
        self.config
    }

    /// ساخت Config با اعتبارسنجی
    ///
    /// # Errors
    /// خطا برمیگردونه اگه اعتبارسنجی fail بشه
    pub fn build_validated(self) -> Result<Config> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}
