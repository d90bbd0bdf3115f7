//! # چرخه عمر برنامه (Lifecycle)
//!
//! ترتیب راه‌اندازی:
//! 1. اتصال دیتابیس و migration
//! 2. ساخت کش و سرویس‌ها
//! 3. راه‌اندازی worker‌های کلیک (قبل از اولین redirect)
//! 4. serve
//!
//! ترتیب خاموش شدن برعکسه:
//! 1. سرور دیگه اتصال جدید قبول نمیکنه و request‌های جاری تموم میشن
//! 2. صف کلیک بسته و تخلیه میشه (با سقف `SHUTDOWN_TIMEOUT_SECS`)
//! 3. pool دیتابیس بسته میشه

use std::{future::Future, net::SocketAddr};

use axum::Router;
use tokio::{net::TcpListener, signal};
use tracing::{error, info, warn};

use crate::{
    api::create_router,
    cache::build_cache,
    config::Config,
    database::Database,
    error::{AppError, Result},
    services::AppState,
};

/// برنامه آماده برای serve
#[derive(Clone)]
pub struct Application {
    state: AppState,
}

impl Application {
    /// ساخت کامل برنامه از روی تنظیمات
    ///
    /// # Errors
    /// - دیتابیس وصل نشه یا migration fail بشه
    /// - کش Redis انتخاب شده باشه و وصل نشه
    pub async fn build(config: Config) -> Result<Self> {
        let database = Database::connect(&config.database_url).await?;
        database.migrate().await?;
        info!("Database migrations applied");

        Self::with_database(config, database).await
    }

    /// ساخت برنامه روی یک دیتابیس آماده (مثلا `Database::in_memory`)
    pub async fn with_database(config: Config, database: Database) -> Result<Self> {
        let cache = build_cache(&config).await?;
        let state = AppState::new(database, cache, config);

        // worker‌ها باید قبل از اولین request وجود داشته باشن
        state.click_pipeline.start(state.config.click_workers);

        Ok(Self { state })
    }

    /// state مشترک handler‌ها
    #[must_use]
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Router کامل برنامه
    #[must_use]
    pub fn router(&self) -> Router {
        create_router(self.state.clone())
    }

    /// serve تا وقتی `shutdown` تموم بشه، بعد تخلیه و آزادسازی منابع
    ///
    /// # Errors
    /// - خطای سرور HTTP
    /// - تخلیه صف کلیک در مهلت تعیین شده تموم نشه (منابع به هر حال آزاد میشن)
    pub async fn run_until<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        info!("Server listening on http://{}", addr);

        axum::serve(
            listener,
            self.router()
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| AppError::Server(e.to_string()))?;

        info!("Server stopped accepting requests");

        let drained = self
            .state
            .click_pipeline
            .shutdown(self.state.config.shutdown_timeout())
            .await;
        if let Err(e) = &drained {
            error!(error = %e, "Click pipeline did not drain cleanly");
        }

        self.state.database.close().await;
        info!("Shutdown complete");

        drained
    }
}

/// منتظر Ctrl+C یا SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}
