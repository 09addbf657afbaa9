//! HTTP Server & Routing Integration Tests
//!
//! Drives the full router with tower `oneshot` requests against a temp
//! dataset root: upload happy paths, validation rejections, traversal
//! hardening, health and stats endpoints.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use soundpool_si::ingest::IngestStore;
use soundpool_si::{build_router, AppState};
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "soundpool-test-boundary";

/// Create test app state backed by a temp dataset root
fn test_app_state() -> (AppState, TempDir) {
    let temp = TempDir::new().unwrap();
    let store = IngestStore::open(temp.path(), "wav").unwrap();
    (AppState::new(store), temp)
}

/// Build a multipart body from (name, optional filename, content) parts
fn multipart_body(parts: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, filename, content) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match filename {
            Some(f) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{f}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
            ),
        }
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn multipart_request(uri: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

/// Synthesize a small mono WAV clip
fn wav_bytes(sample_count: usize) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for i in 0..sample_count {
            writer.write_sample((i as i16) % 128).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

async fn json_body(response: axum::response::Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn health_endpoint_returns_json() {
    let (state, _temp) = test_app_state();
    let app = build_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["module"], "soundpool-si");
    assert!(json["version"].is_string());
    assert!(json["uptime_seconds"].is_number());
}

#[tokio::test]
async fn training_upload_persists_file() {
    let (state, temp) = test_app_state();
    let app = build_router(state);

    let wav = wav_bytes(256);
    let body = multipart_body(&[
        ("speaker", None, b"alice"),
        ("category", None, b"keyboard"),
        ("file", Some("clip.wav"), &wav),
    ]);

    let response = app
        .oneshot(multipart_request("/upload/training", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["status"], "success");
    assert_eq!(json["mode"], "training");
    assert_eq!(json["speaker"], "alice");
    assert_eq!(json["category"], "keyboard");

    let filename = json["filename"].as_str().unwrap();
    assert!(filename.starts_with("keyboard_"));
    assert!(filename.ends_with(".wav"));

    let path = std::path::PathBuf::from(json["path"].as_str().unwrap());
    assert!(path.starts_with(temp.path().join("training").join("alice")));
    assert_eq!(std::fs::read(&path).unwrap(), wav);
    assert_eq!(json["size_bytes"].as_u64().unwrap(), wav.len() as u64);
}

#[tokio::test]
async fn training_upload_without_speaker_is_rejected() {
    let (state, temp) = test_app_state();
    let app = build_router(state);

    let wav = wav_bytes(16);
    let body = multipart_body(&[
        ("category", None, b"keyboard"),
        ("file", Some("clip.wav"), &wav),
    ]);

    let response = app
        .oneshot(multipart_request("/upload/training", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = json_body(response).await;
    assert_eq!(json["error"]["code"], "MISSING_FIELD");

    // The rejection happened before any disk activity
    let speakers: Vec<_> = std::fs::read_dir(temp.path().join("training"))
        .unwrap()
        .collect();
    assert!(speakers.is_empty());
}

#[tokio::test]
async fn training_upload_with_file_before_metadata_is_rejected() {
    let (state, _temp) = test_app_state();
    let app = build_router(state);

    let wav = wav_bytes(16);
    let body = multipart_body(&[
        ("file", Some("clip.wav"), &wav),
        ("speaker", None, b"alice"),
        ("category", None, b"keyboard"),
    ]);

    let response = app
        .oneshot(multipart_request("/upload/training", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["error"]["code"], "MISSING_FIELD");
}

#[tokio::test]
async fn recognition_upload_confines_traversal_names() {
    let (state, temp) = test_app_state();
    let app = build_router(state);

    let wav = wav_bytes(16);
    let body = multipart_body(&[("file", Some("../../etc/passwd"), &wav)]);

    let response = app
        .oneshot(multipart_request("/upload/recognition", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["mode"], "recognition");

    let filename = json["filename"].as_str().unwrap();
    assert!(filename.starts_with("rec_"));
    assert!(!filename.contains(".."));

    let path = std::path::PathBuf::from(json["path"].as_str().unwrap());
    assert!(path.starts_with(temp.path().join("recognition")));
    assert!(!path.starts_with(temp.path().join("training")));
    assert!(path.exists());
}

#[tokio::test]
async fn recognition_upload_without_filename_succeeds() {
    let (state, _temp) = test_app_state();
    let app = build_router(state);

    let wav = wav_bytes(16);
    let body = multipart_body(&[("file", None, &wav)]);

    let response = app
        .oneshot(multipart_request("/upload/recognition", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    let filename = json["filename"].as_str().unwrap();
    assert!(filename.starts_with("rec_"));
    assert!(filename.ends_with(".wav"));
}

#[tokio::test]
async fn empty_file_part_is_rejected() {
    let (state, temp) = test_app_state();
    let app = build_router(state);

    let body = multipart_body(&[("file", Some("empty.wav"), b"")]);

    let response = app
        .oneshot(multipart_request("/upload/recognition", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["error"]["code"], "EMPTY_PAYLOAD");

    let pool: Vec<_> = std::fs::read_dir(temp.path().join("recognition"))
        .unwrap()
        .collect();
    assert!(pool.is_empty());
}

#[tokio::test]
async fn upload_without_file_part_is_rejected() {
    let (state, _temp) = test_app_state();
    let app = build_router(state);

    let body = multipart_body(&[
        ("speaker", None, b"alice"),
        ("category", None, b"keyboard"),
    ]);

    let response = app
        .oneshot(multipart_request("/upload/training", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["error"]["code"], "MISSING_FIELD");
}

#[tokio::test]
async fn unknown_route_is_404() {
    let (state, _temp) = test_app_state();
    let app = build_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/upload/other")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cors_preflight_allows_lan_capture_pages() {
    let (state, _temp) = test_app_state();
    let app = build_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/upload/training")
                .header(header::ORIGIN, "http://192.168.1.50:8501")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}

#[tokio::test]
async fn dataset_stats_reflect_uploads() {
    let (state, _temp) = test_app_state();

    let wav = wav_bytes(64);

    let body = multipart_body(&[
        ("speaker", None, b"alice"),
        ("category", None, b"keyboard"),
        ("file", Some("clip.wav"), &wav),
    ]);
    let response = build_router(state.clone())
        .oneshot(multipart_request("/upload/training", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = multipart_body(&[("file", Some("mystery.wav"), &wav)]);
    let response = build_router(state.clone())
        .oneshot(multipart_request("/upload/recognition", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = build_router(state)
        .oneshot(
            Request::builder()
                .uri("/dataset/stats")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["training_samples"], 1);
    assert_eq!(json["recognition_samples"], 1);
    assert_eq!(json["speakers"]["alice"], 1);
    assert_eq!(json["by_extension"]["wav"], 2);
    assert_eq!(
        json["total_bytes"].as_u64().unwrap(),
        2 * wav.len() as u64
    );
}
