//! # تست‌های Integration
//!
//! این فایل تست‌های end-to-end رو شامل میشه: سرویس‌ها روی SQLite
//! in-memory، HTTP با `tower::ServiceExt::oneshot` و یک سرور واقعی با reqwest.
//!
//! ## اجرای تست‌ها:
//! ```bash
//! cargo test                    # همه تست‌ها
//! cargo test --lib              # فقط تست‌های unit
//! cargo test --test integration_tests  # فقط این فایل
//! ```

use std::time::Duration;

use link_relay::{
    config::ConfigBuilder,
    database::Database,
    lifecycle::Application,
};

/// برنامه کامل روی دیتابیس in-memory
async fn test_app() -> Application {
    let config = ConfigBuilder::new()
        .base_url("http://sho.rt")
        .click_workers(2)
        .build();

    Application::with_database(config, Database::in_memory().await.unwrap())
        .await
        .unwrap()
}

const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

// =====================================
// تست‌های Resolver
// =====================================
mod resolver_tests {
    use super::*;
    use link_relay::{
        database::{LinkRepository, LinkStore},
        error::AppError,
        models::ClickEvent,
        services::SubmitOutcome,
        utils,
    };
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_create_resolve_click_roundtrip() {
        let app = test_app().await;
        let state = app.state();

        let created = state
            .url_service
            .create_short_link("https://example.com/page")
            .await
            .unwrap();
        assert_eq!(created.short_code.len(), 6);
        assert!(utils::is_short_code_alphabet(&created.short_code));

        let resolved = state.url_service.resolve(&created.short_code).await.unwrap();
        assert_eq!(resolved.original_url, "https://example.com/page");
        assert_eq!(resolved.click_count, 0);

        let outcome = state.click_pipeline.submit(ClickEvent::new(
            resolved.id,
            "203.0.113.7",
            "curl/8.4.0",
            "",
        ));
        assert_eq!(outcome, SubmitOutcome::Accepted);

        state.click_pipeline.shutdown(DRAIN_TIMEOUT).await.unwrap();

        let store = LinkRepository::new(state.database.clone());
        let stored = store.find_by_code(&created.short_code).await.unwrap().unwrap();
        assert_eq!(stored.click_count, 1);
    }

    #[tokio::test]
    async fn test_same_url_twice_returns_same_link() {
        let app = test_app().await;
        let svc = &app.state().url_service;

        let first = svc.create_short_link("https://example.com/page").await.unwrap();
        let second = svc.create_short_link("https://example.com/page").await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.short_code, second.short_code);
    }

    #[tokio::test]
    async fn test_distinct_urls_get_distinct_codes() {
        let app = test_app().await;
        let svc = &app.state().url_service;

        let a = svc.create_short_link("https://example.com/a").await.unwrap();
        let b = svc.create_short_link("https://example.com/b").await.unwrap();

        assert_ne!(a.short_code, b.short_code);
    }

    #[tokio::test]
    async fn test_invalid_url_is_rejected() {
        let app = test_app().await;
        let result = app.state().url_service.create_short_link("not-a-url").await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_trailing_newline_does_not_split_dedup() {
        let app = test_app().await;
        let svc = &app.state().url_service;

        let result = svc.create_short_link("https://example.com/page\n").await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        let store = LinkRepository::new(app.state().database.clone());
        assert!(store
            .find_by_original_url("https://example.com/page\n")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_unknown_code_is_not_found() {
        let app = test_app().await;
        let result = app.state().url_service.resolve("zzzzzz").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_clicks_after_shutdown_are_dropped() {
        let app = test_app().await;
        let state = app.state();
        let link = state
            .url_service
            .create_short_link("https://example.com")
            .await
            .unwrap();

        state.click_pipeline.shutdown(DRAIN_TIMEOUT).await.unwrap();

        let outcome = state
            .click_pipeline
            .submit(ClickEvent::new(link.id, "ip", "ua", ""));
        assert_eq!(outcome, SubmitOutcome::Closed);

        let store = LinkRepository::new(state.database.clone());
        let stored = store.find_by_code(&link.short_code).await.unwrap().unwrap();
        assert_eq!(stored.click_count, 0);
    }
}

// =====================================
// تست‌های HTTP
// =====================================
mod http_tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        Router,
    };
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, headers, body)
    }

    fn create_request(payload: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/v1/urls")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn create(app: &Application, url: &str) -> String {
        let (status, _, body) = send(
            app.router(),
            create_request(&json!({ "url": url }).to_string()),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["data"]["short_code"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_create_short_link_endpoint() {
        let app = test_app().await;

        let (status, _, body) = send(
            app.router(),
            create_request(r#"{"url":"https://example.com/page"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["data"]["original_url"], json!("https://example.com/page"));
        assert_eq!(body["data"]["click_count"], json!(0));

        let code = body["data"]["short_code"].as_str().unwrap();
        assert_eq!(code.len(), 6);
        assert_eq!(
            body["data"]["short_url"],
            json!(format!("http://sho.rt/{}", code))
        );
    }

    #[tokio::test]
    async fn test_create_is_idempotent_over_http() {
        let app = test_app().await;
        let first = create(&app, "https://example.com/page").await;
        let second = create(&app, "https://example.com/page").await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_invalid_url_returns_400() {
        let app = test_app().await;

        let (status, _, body) = send(app.router(), create_request(r#"{"url":"not-a-url"}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status_code"], json!(400));

        let (status, _, _) = send(app.router(), create_request(r#"{"link":"oops"}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _, _) = send(app.router(), create_request(r#"{"url":""}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_url_with_control_characters_returns_400() {
        let app = test_app().await;

        for url in ["https://example.com/page\n", "https://example.com/a\r\nX-Evil: 1"] {
            let payload = json!({ "url": url }).to_string();
            let (status, _, body) = send(app.router(), create_request(&payload)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "accepted {:?}", url);
            assert_eq!(body["status_code"], json!(400));
        }

        // نسخه تمیز همون URL طبیعی ساخته میشه و redirect سالمه
        let code = create(&app, "https://example.com/page").await;
        let (status, headers, _) = send(app.router(), get(&format!("/{}", code))).await;
        assert_eq!(status, StatusCode::FOUND);
        assert_eq!(
            headers.get(header::LOCATION).unwrap(),
            "https://example.com/page"
        );
    }

    #[tokio::test]
    async fn test_redirect_returns_302_with_location() {
        let app = test_app().await;
        let code = create(&app, "https://example.com/page").await;

        let request = Request::builder()
            .uri(format!("/{}", code))
            .header("X-Forwarded-For", "203.0.113.7, 10.0.0.1")
            .header(header::USER_AGENT, "curl/8.4.0")
            .body(Body::empty())
            .unwrap();
        let (status, headers, _) = send(app.router(), request).await;

        assert_eq!(status, StatusCode::FOUND);
        assert_eq!(
            headers.get(header::LOCATION).unwrap(),
            "https://example.com/page"
        );
    }

    #[tokio::test]
    async fn test_unknown_code_returns_404() {
        let app = test_app().await;

        let (status, _, body) = send(app.router(), get("/zzzzzz")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], json!("Not Found"));

        let (status, _, _) = send(app.router(), get("/api/v1/urls/zzzzzz")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _, _) = send(app.router(), get("/api/v1/analytics/zzzzzz")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_url_info_endpoint() {
        let app = test_app().await;
        let code = create(&app, "https://example.com/page").await;

        let (status, _, body) = send(app.router(), get(&format!("/api/v1/urls/{}", code))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["short_code"], json!(code));
    }

    #[tokio::test]
    async fn test_delete_endpoint() {
        let app = test_app().await;
        let code = create(&app, "https://example.com/page").await;
        let uri = format!("/api/v1/urls/{}", code);

        let delete = Request::builder()
            .method("DELETE")
            .uri(&uri)
            .body(Body::empty())
            .unwrap();
        let (status, _, _) = send(app.router(), delete).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        // کش هم invalidate شده
        let (status, _, _) = send(app.router(), get(&format!("/{}", code))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let again = Request::builder()
            .method("DELETE")
            .uri(&uri)
            .body(Body::empty())
            .unwrap();
        let (status, _, _) = send(app.router(), again).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_analytics_after_redirects() {
        let app = test_app().await;
        let code = create(&app, "https://example.com/page").await;

        for referer in ["https://www.google.com/search?q=rust", ""] {
            let mut builder = Request::builder().uri(format!("/{}", code)).header(
                header::USER_AGENT,
                "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0",
            );
            if !referer.is_empty() {
                builder = builder.header(header::REFERER, referer);
            }
            let (status, _, _) = send(app.router(), builder.body(Body::empty()).unwrap()).await;
            assert_eq!(status, StatusCode::FOUND);
        }

        app.state().click_pipeline.shutdown(DRAIN_TIMEOUT).await.unwrap();

        let (status, _, body) =
            send(app.router(), get(&format!("/api/v1/analytics/{}", code))).await;
        assert_eq!(status, StatusCode::OK);

        let data = &body["data"];
        assert_eq!(data["total_clicks"], json!(2));
        assert_eq!(data["daily_clicks"][0]["count"], json!(2));
        assert_eq!(data["browsers"][0]["browser"], json!("Firefox"));
        assert_eq!(data["browsers"][0]["version"], json!("121"));
        assert_eq!(data["browsers"][0]["count"], json!(2));

        let referrers = data["referrers"].as_array().unwrap();
        assert_eq!(referrers.len(), 2);
        assert!(referrers.iter().all(|r| r["percent"] == json!("50.0%")));
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = test_app().await;

        let (status, headers, body) = send(app.router(), get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], json!("healthy"));
        assert_eq!(body["database"], json!(true));
        assert!(headers.contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_request_id_is_echoed() {
        let app = test_app().await;

        let request = Request::builder()
            .uri("/health")
            .header("X-Request-Id", "trace-me-42")
            .body(Body::empty())
            .unwrap();
        let (_, headers, _) = send(app.router(), request).await;
        assert_eq!(headers.get("x-request-id").unwrap(), "trace-me-42");
    }
}

// =====================================
// تست چرخه عمر با سرور واقعی
// =====================================
mod lifecycle_tests {
    use super::*;
    use link_relay::{
        database::{LinkRepository, LinkStore},
        models::ClickEvent,
        services::SubmitOutcome,
    };
    use serde_json::{json, Value};
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_live_server_redirect_and_graceful_shutdown() {
        let app = test_app().await;
        let state = app.state().clone();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
        let server = tokio::spawn(app.run_until(listener, async {
            stop_rx.await.ok();
        }));

        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap();

        let created: Value = client
            .post(format!("http://{}/api/v1/urls", addr))
            .json(&json!({ "url": "https://example.com/page" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let code = created["data"]["short_code"].as_str().unwrap().to_string();

        let response = client
            .get(format!("http://{}/{}", addr, code))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 302);
        assert_eq!(
            response.headers().get("location").unwrap().to_str().unwrap(),
            "https://example.com/page"
        );

        // کلیک ناهمگام ثبت میشه
        let store = LinkRepository::new(state.database.clone());
        let mut clicks = 0;
        for _ in 0..100 {
            clicks = store.find_by_code(&code).await.unwrap().unwrap().click_count;
            if clicks == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(clicks, 1);

        stop_tx.send(()).unwrap();
        server.await.unwrap().unwrap();

        assert!(state.click_pipeline.is_closed());
        assert_eq!(
            state.click_pipeline.submit(ClickEvent::new(1, "ip", "ua", "")),
            SubmitOutcome::Closed
        );
        assert!(state.database.health_check().await.is_err());
    }
}

// =====================================
// Property-Based Tests
// =====================================
mod property_tests {
    use link_relay::utils;
    use proptest::prelude::*;

    proptest! {
        /// هر کد تولید شده طول درست و الفبای درست داره
        #[test]
        fn generated_codes_have_requested_shape(len in 0usize..32) {
            let code = utils::generate_short_code(len);
            prop_assert_eq!(code.len(), len);
            prop_assert!(utils::is_short_code_alphabet(&code));
        }

        /// هر آدرس http(s) با hostname ساده قبول میشه
        #[test]
        fn simple_http_urls_are_valid(
            scheme in prop::sample::select(vec!["http", "https"]),
            host in "[a-z][a-z0-9]{0,20}\\.[a-z]{2,6}",
            path in "(/[a-zA-Z0-9_-]{0,10}){0,3}",
        ) {
            let url = format!("{}://{}{}", scheme, host, path);
            prop_assert!(utils::validate_url(&url).is_ok(), "rejected {}", url);
        }

        /// بدون scheme هیچوقت قبول نمیشه
        #[test]
        fn urls_without_scheme_are_rejected(host in "[a-z]{1,20}\\.[a-z]{2,6}") {
            prop_assert!(utils::validate_url(&host).is_err());
        }

        /// کاراکتر کنترلی هر جای URL باشه رد میشه
        #[test]
        fn urls_with_control_characters_are_rejected(
            host in "[a-z]{1,20}\\.[a-z]{2,6}",
            control in prop::sample::select(vec!['\n', '\r', '\t', '\0', '\u{7f}']),
            at_end in any::<bool>(),
        ) {
            let url = if at_end {
                format!("https://{}/page{}", host, control)
            } else {
                format!("https://{}{}/page", host, control)
            };
            prop_assert!(utils::validate_url(&url).is_err(), "accepted {:?}", url);
        }
    }
}

// =====================================
// Round-trip Property Tests
// =====================================
mod roundtrip_property_tests {
    use super::*;
    use proptest::prelude::*;

    /// URL معتبر تصادفی: scheme، host، path و query اختیاری
    fn valid_url() -> impl Strategy<Value = String> {
        (
            prop::sample::select(vec!["http", "https"]),
            "[a-z][a-z0-9]{0,15}\\.[a-z]{2,6}",
            prop::option::of(1u16..65535),
            "(/[a-zA-Z0-9._~-]{1,12}){0,4}",
            prop::option::of("[a-z]{1,8}=[a-zA-Z0-9]{0,8}"),
        )
            .prop_map(|(scheme, host, port, path, query)| {
                let port = port.map(|p| format!(":{}", p)).unwrap_or_default();
                let query = query.map(|q| format!("?{}", q)).unwrap_or_default();
                format!("{}://{}{}{}{}", scheme, host, port, path, query)
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        /// برای هر URL معتبر: resolve(create(u)) == u، و create دوباره همون کد رو میده
        #[test]
        fn resolve_returns_created_url(urls in prop::collection::vec(valid_url(), 1..6)) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();

            runtime.block_on(async {
                let app = test_app().await;
                let svc = &app.state().url_service;

                for url in &urls {
                    let created = svc.create_short_link(url).await.unwrap();
                    let resolved = svc.resolve(&created.short_code).await.unwrap();
                    assert_eq!(&resolved.original_url, url);

                    let again = svc.create_short_link(url).await.unwrap();
                    assert_eq!(again.short_code, created.short_code);
                    assert_eq!(again.id, created.id);
                }

                // URL‌های متمایز رکوردهای متمایز دارن
                let mut distinct = urls.clone();
                distinct.sort();
                distinct.dedup();
                let mut codes = Vec::new();
                for url in &distinct {
                    codes.push(svc.create_short_link(url).await.unwrap().short_code);
                }
                codes.sort();
                codes.dedup();
                assert_eq!(codes.len(), distinct.len());

                app.state().click_pipeline.shutdown(DRAIN_TIMEOUT).await.unwrap();
            });
        }
    }
}
