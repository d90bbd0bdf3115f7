//! # URL Handlers
//!
//! Handler‌های ساخت، مشاهده، حذف و redirect لینک‌ها

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::{debug, info};

use crate::{
    api::extractors::{ClientInfo, ValidatedJson},
    error::Result,
    models::{ApiResponse, ClickEvent, CreateShortLinkRequest, ShortLinkResponse},
    services::{AppState, SubmitOutcome},
    utils::mask_string,
};

// =====================================
// Create Short URL
// =====================================
/// ساخت لینک کوتاه
///
/// اگه URL قبلا کوتاه شده باشه همون لینک برمیگرده (باز هم 201).
///
/// # Endpoint
/// `POST /api/v1/urls`
///
/// # Request Body
/// ```json
/// { "url": "https://example.com/long-url" }
/// ```
///
/// # Response
/// ```json
/// {
///   "success": true,
///   "data": {
///     "short_code": "aB3xY9",
///     "short_url": "http://localhost:8080/aB3xY9",
///     "original_url": "https://example.com/long-url",
///     "click_count": 0,
///     "created_at": "..."
///   }
/// }
/// ```
pub async fn create_url(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateShortLinkRequest>,
) -> Result<impl IntoResponse> {
    let link = state.url_service.create_short_link(&request.url).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(ShortLinkResponse::from_link(
            &link,
            &state.config.base_url,
        ))),
    ))
}

// =====================================
// Redirect
// =====================================
/// Redirect به URL اصلی
///
/// کلیک فقط تحویل صف داده میشه؛ redirect منتظر ثبتش نمیمونه و اگه صف
/// پر باشه کلیک از دست میره ولی redirect انجام میشه.
///
/// # Endpoint
/// `GET /:code`
///
/// # Response
/// - 302 Found با header `Location`
/// - 404 اگه پیدا نشه
pub async fn redirect_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
    client: ClientInfo,
) -> Result<Response> {
    let link = state.url_service.resolve(&code).await?;

    let outcome = state.click_pipeline.submit(ClickEvent::new(
        link.id,
        client.ip_address.as_str(),
        client.user_agent,
        client.referer,
    ));
    if outcome != SubmitOutcome::Accepted {
        debug!(short_code = %code, ?outcome, "Click not queued");
    }

    info!(short_code = %code, client = %mask_string(&client.ip_address, 4), "Redirecting");

    Ok((StatusCode::FOUND, [(header::LOCATION, link.original_url)]).into_response())
}

// =====================================
// Get URL Info
// =====================================
/// اطلاعات لینک
///
/// از مسیر resolve خونده میشه، پس `click_count` ممکنه تا انقضای کش کهنه باشه.
///
/// # Endpoint
/// `GET /api/v1/urls/:code`
pub async fn get_url_info(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<ApiResponse<ShortLinkResponse>>> {
    let link = state.url_service.resolve(&code).await?;

    Ok(Json(ApiResponse::success(ShortLinkResponse::from_link(
        &link,
        &state.config.base_url,
    ))))
}

// =====================================
// Delete URL
// =====================================
/// حذف لینک و همه کلیک‌هاش
///
/// # Endpoint
/// `DELETE /api/v1/urls/:code`
///
/// # Response
/// 204 No Content
pub async fn delete_url(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse> {
    state.url_service.delete_short_link(&code).await?;

    Ok(StatusCode::NO_CONTENT)
}
