//! # Analytics Handler

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    error::Result,
    models::{Analytics, ApiResponse},
    services::AppState,
};

/// آمار کلیک‌های یک لینک
///
/// # Endpoint
/// `GET /api/v1/analytics/:code`
///
/// # Response
/// ```json
/// {
///   "success": true,
///   "data": {
///     "total_clicks": 12,
///     "daily_clicks": [{ "date": "2024-01-07", "count": 5 }],
///     "referrers": [{ "referrer": "google.com", "count": 8, "percent": "66.7%" }],
///     "browsers": [{ "browser": "Firefox", "version": "121", "count": 4 }]
///   }
/// }
/// ```
pub async fn get_analytics(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<ApiResponse<Analytics>>> {
    let analytics = state.analytics_service.for_short_code(&code).await?;

    Ok(Json(ApiResponse::success(analytics)))
}
