// Router-level checks: routing, identity precondition, and not-found
// handling. The full pipeline is covered by orchestrator_tests.


use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use voicenotes::config::{
    CacheConfig, CaptureSettings, Config, EngineConfig, HttpConfig, RateLimitConfig,
    ServiceConfig, StorageConfig, UploadConfig,
};
use voicenotes::{create_router, AppState};

fn test_config(storage_root: &std::path::Path) -> Config {
    Config {
        service: ServiceConfig {
            name: "voicenotes-test".to_string(),
            http: HttpConfig {
                bind: "127.0.0.1".to_string(),
                port: 8080,
            },
        },
        engine: EngineConfig {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 5,
        },
        storage: StorageConfig {
            root: storage_root.display().to_string(),
            public_base: "/artifacts".to_string(),
        },
        upload: UploadConfig {
            max_bytes: 25 * 1024 * 1024,
            rate_limit: RateLimitConfig {
                window_ms: 60_000,
                max_requests: 10,
            },
        },
        capture: CaptureSettings {
            sample_rate: 16000,
            channels: 1,
            chunk_interval_secs: 1,
            max_duration_secs: 600,
            auto_save: true,
        },
        cache: CacheConfig { ttl_secs: 3600 },
    }
}

fn test_router() -> (axum::Router, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let state = AppState::new(test_config(dir.path())).unwrap();
    (create_router(state), dir)
}

fn multipart_body(boundary: &str) -> String {
    format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\nhello\r\n--{boundary}--\r\n"
    )
}

#[tokio::test]
async fn health_check_responds_ok() {
    let (router, _dir) = test_router();

    let response = router
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn submission_without_identity_is_rejected() {
    let (router, _dir) = test_router();
    let boundary = "test-boundary";

    let request = Request::post("/transcriptions")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(multipart_body(boundary)))
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn submission_without_a_file_field_is_a_bad_request() {
    let (router, _dir) = test_router();
    let boundary = "test-boundary";

    let request = Request::post("/transcriptions")
        .header("x-owner-id", "owner-1")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(multipart_body(boundary)))
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_transcription_is_not_found() {
    let (router, _dir) = test_router();

    let request = Request::get("/transcriptions/no-such-id")
        .header("x-owner-id", "owner-1")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn record_fetch_without_identity_is_rejected() {
    let (router, _dir) = test_router();

    let request = Request::get("/transcriptions/some-id")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
