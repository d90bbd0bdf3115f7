//! # Link Relay - نقطه ورود برنامه
//!
//! ## مفاهیم Rust در این فایل:
//! - `async fn main()`: تابع اصلی غیرهمزمان با tokio
//! - `anyhow::Result`: خطای کلی برای سطح باینری
//! - `?` operator: انتشار خطا به بالا

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use link_relay::{
    config::Config,
    lifecycle::{shutdown_signal, Application},
};

/// نقطه ورود اصلی برنامه
///
/// # Errors
/// خطا برمیگردونه اگه:
/// - تنظیمات لود نشن
/// - دیتابیس یا کش متصل نشه
/// - سرور استارت نشه
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // اگه فایل .env نباشه اوکیه
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    init_tracing(config.environment.is_production());

    info!("🚀 Starting Link Relay...");
    info!(
        environment = ?config.environment,
        cache = ?config.cache_backend,
        workers = config.click_workers,
        "✅ Configuration loaded"
    );

    // bind قبل از build تا خطای پورت زود دیده بشه
    let listener = TcpListener::bind(config.server_addr()).await?;

    let app = Application::build(config).await?;
    info!("✅ Application ready");

    app.run_until(listener, shutdown_signal()).await?;

    Ok(())
}

/// راه‌اندازی سیستم tracing برای لاگینگ
///
/// # مفاهیم:
/// - EnvFilter: فیلتر کردن لاگ‌ها بر اساس متغیر `RUST_LOG`
/// - در production خروجی JSON، در development خروجی pretty
fn init_tracing(json: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("link_relay=debug,tower_http=debug"));

    let registry = tracing_subscriber::registry().with(env_filter);

    if json {
        registry
            .with(fmt::layer().json().with_target(true).with_current_span(true))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_level(true)
                    .pretty(),
            )
            .init();
    }
}
