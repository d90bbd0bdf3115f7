//! # Link Relay Library
//!
//! این کتابخانه یک سرویس کوتاه‌کننده لینک با ثبت ناهمگام کلیک‌ها ارائه میده.
//!
//! ## ساختار پروژه
//!
//! ```text
//! src/
//! ├── lib.rs          # نقطه ورود کتابخانه - اینجا!
//! ├── main.rs         # نقطه ورود باینری
//! ├── config/         # مدیریت تنظیمات
//! ├── error/          # تعریف خطاها
//! ├── cache/          # کش resolve (moka / Redis / بدون کش)
//! ├── database/       # لایه دیتابیس
//! ├── models/         # مدل‌های داده
//! ├── services/       # منطق کسب‌وکار + صف کلیک
//! ├── api/            # لایه API
//! ├── lifecycle/      # راه‌اندازی و خاموش شدن
//! └── utils/          # توابع کمکی
//! ```
//!
//! ## مثال استفاده
//!
//! ```rust,no_run
//! use link_relay::{config::Config, lifecycle::{shutdown_signal, Application}};
//!
//! #[tokio::main]
//! async fn main() -> link_relay::Result<()> {
//!     let config = Config::from_env()?;
//!     let listener = tokio::net::TcpListener::bind(config.server_addr()).await?;
//!     let app = Application::build(config).await?;
//!     app.run_until(listener, shutdown_signal()).await
//! }
//! ```

// =====================================
// Module Declarations
// =====================================

/// ماژول مدیریت تنظیمات برنامه
pub mod config;

/// ماژول تعریف و مدیریت خطاها
pub mod error;

/// ماژول کش لینک‌ها
pub mod cache;

/// ماژول ارتباط با دیتابیس
pub mod database;

/// ماژول مدل‌های داده (Domain Models)
pub mod models;

/// ماژول سرویس‌ها (Business Logic)
pub mod services;

/// ماژول API و HTTP Handlers
pub mod api;

/// ماژول راه‌اندازی و خاموش شدن
pub mod lifecycle;

/// ماژول توابع کمکی
pub mod utils;

// =====================================
// Re-exports
// =====================================

/// نتیجه عملیات با خطای سفارشی ما
pub use error::Result;

/// خطای اصلی برنامه
pub use error::AppError;

// =====================================
// Prelude Module
// =====================================
/// ماژول prelude برای import راحت‌تر آیتم‌های پرکاربرد
///
/// کاربرد:
/// ```rust
/// use link_relay::prelude::*;
/// ```
pub mod prelude {
    pub use crate::cache::{LinkCache, MemoryCache, NullCache};
    pub use crate::config::{Config, ConfigBuilder};
    pub use crate::database::{Database, LinkRepository, LinkStore};
    pub use crate::error::{AppError, Result};
    pub use crate::lifecycle::Application;
    pub use crate::models::*;
    pub use crate::services::*;
}
