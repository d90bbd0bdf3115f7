//! # ماژول سرویس‌ها (Business Logic Layer)
//!
//! این ماژول منطق کسب‌وکار برنامه رو پیاده‌سازی میکنه.
//!
//! ## لایه‌بندی معماری
//!
//! ```text
//! ┌─────────────────┐
//! │    API Layer    │  <-- HTTP handlers (axum)
//! ├─────────────────┤
//! │  Service Layer  │  <-- Business logic (اینجا!)
//! ├─────────────────┤
//! │ Repository Layer│  <-- Data access
//! ├─────────────────┤
//! │    Database     │  <-- SQLite (+ cache)
//! └─────────────────┘
//! ```
//!
//! ## مفاهیم Rust:
//! - **Dependency Injection**: تزریق وابستگی‌ها
//! - **Traits برای Abstraction**: interface تعریف کردن
//! - **Arc<T>**: اشتراک امن بین threads
//! - **async/await**: عملیات غیرهمزمان

mod url_service;
mod click_pipeline;
mod analytics_service;

pub use url_service::*;
pub use click_pipeline::*;
pub use analytics_service::*;

use std::sync::Arc;

use crate::{
    cache::LinkCache,
    config::Config,
    database::{AnalyticsRepository, Database, LinkRepository, LinkStore},
};

// =====================================
// Application State
// =====================================
/// وضعیت برنامه که بین همه handlers اشتراک‌گذاری میشه
///
/// # مفاهیم:
/// - `Arc<T>`: Reference counting برای thread-safe sharing
/// - `Clone`: کپی کردن (فقط Arc clone میشه، نه داده)
/// - این state با `Router::with_state` به handlers میرسه
#[derive(Clone)]
pub struct AppState {
    /// تنظیمات برنامه
    pub config: Arc<Config>,

    /// دیتابیس (برای health check)
    pub database: Database,

    /// سرویس ساخت و resolve لینک
    pub url_service: Arc<UrlService>,

    /// صف کلیک‌ها
    pub click_pipeline: Arc<ClickPipeline>,

    /// سرویس آمار
    pub analytics_service: Arc<AnalyticsService>,
}

impl AppState {
    /// ساخت AppState جدید
    ///
    /// worker‌های صف کلیک اینجا راه نمیفتن؛ این کار `Application::build` هست.
    #[must_use]
    pub fn new(db: Database, cache: Arc<dyn LinkCache>, config: Config) -> Self {
        let store: Arc<dyn LinkStore> = Arc::new(LinkRepository::new(db.clone()));
        let config = Arc::new(config);

        let url_service = Arc::new(UrlService::new(
            store.clone(),
            cache,
            config.short_code_length,
        ));
        let click_pipeline = Arc::new(ClickPipeline::new(store, config.click_queue_capacity));
        let analytics_service = Arc::new(AnalyticsService::new(AnalyticsRepository::new(db.clone())));

        Self {
            config,
            database: db,
            url_service,
            click_pipeline,
            analytics_service,
        }
    }
}
