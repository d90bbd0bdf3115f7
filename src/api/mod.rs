//! # لایه API
//!
//! این ماژول HTTP handlers و routing رو مدیریت میکنه.
//!
//! ## مفاهیم Rust + Axum:
//! - **Router**: تعریف مسیرها
//! - **Handler Functions**: پردازش request‌ها
//! - **Extractors**: استخراج داده از request
//! - **State**: اشتراک state بین handlers
//! - **Middleware**: پردازش قبل/بعد از handler
//!
//! ## ساختار URL‌ها:
//! - `POST /api/v1/urls` - ساخت لینک کوتاه
//! - `GET /api/v1/urls/:code` - اطلاعات لینک
//! - `DELETE /api/v1/urls/:code` - حذف لینک
//! - `GET /api/v1/analytics/:code` - آمار کلیک‌ها
//! - `GET /health` - Health check
//! - `GET /:code` - Redirect به URL اصلی

mod extractors;
mod handlers;
mod middleware;

pub use extractors::*;
pub use handlers::*;
pub use middleware::*;

use std::time::Duration;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::services::AppState;

/// حداکثر زمان پردازش هر request
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// =====================================
// Router Builder
// =====================================
/// ساخت Router اصلی برنامه
///
/// # مفاهیم:
/// - `.nest()`: گروه‌بندی route‌ها
/// - `.layer()`: اضافه کردن middleware
/// - `.with_state()`: تزریق state
///
/// برای اینکه `ClientInfo` آدرس اتصال رو ببینه، router باید با
/// `into_make_service_with_connect_info::<SocketAddr>()` serve بشه.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .nest("/api/v1", api_routes())
        // route اصلی redirect؛ مسیرهای ثابت بالا اولویت دارن
        .route("/:code", get(handlers::url::redirect_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(axum_middleware::from_fn(request_id))
                .layer(axum_middleware::from_fn(request_timing))
                .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
                .layer(CompressionLayer::new())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
        .with_state(state)
}

/// Route‌های API
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/urls", post(handlers::url::create_url))
        .route(
            "/urls/:code",
            get(handlers::url::get_url_info).delete(handlers::url::delete_url),
        )
        .route("/analytics/:code", get(handlers::analytics::get_analytics))
}
