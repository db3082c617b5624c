//! End-to-end tests driving a running service over a real socket.

use std::path::Path;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use sbi_core::settings::Settings;
use sbi_core::types::{BiometricType, ImageFormat, Purpose};
use sbi_service::{SbiRegistry, ServiceConfig};

fn test_config(dir: &Path) -> ServiceConfig {
    let mut settings = Settings::default();
    settings.server.min_port = 0;
    settings.server.max_port = 0;
    settings.profile.folder = dir.join("profiles");
    settings.profile.device_config_dir = dir.join("devices");
    ServiceConfig {
        purpose: Purpose::Registration,
        biometric_type: BiometricType::BiometricDevice,
        image_format: ImageFormat::Jp2000,
        settings,
    }
}

fn write_sample(dir: &Path, profile: &str, file: &str, bytes: &[u8]) {
    let profile_dir = dir.join("profiles").join(profile);
    std::fs::create_dir_all(&profile_dir).unwrap();
    std::fs::write(profile_dir.join(file), bytes).unwrap();
}

async fn send_raw(port: u16, raw: &[u8]) -> String {
    let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
    stream.write_all(raw).await.unwrap();
    stream.shutdown().await.unwrap();
    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    String::from_utf8_lossy(&response).into_owned()
}

fn request_with_body(verb_line: &str, body: &str) -> Vec<u8> {
    format!(
        "{verb_line}\r\nContent-Length: {}\r\n\r\n{body}",
        body.len()
    )
    .into_bytes()
}

fn response_body(response: &str) -> &str {
    let body = response
        .split_once("\r\n\r\n")
        .map(|(_, b)| b)
        .unwrap_or("");
    body.trim_end_matches(['\r', '\n'])
}

#[tokio::test]
async fn discovery_lists_every_device_helper() {
    let dir = tempfile::tempdir().unwrap();
    let registry = SbiRegistry::new();
    let port = registry.start("disc", test_config(dir.path())).await.unwrap();

    let raw = request_with_body(
        "MOSIPDISC /device HTTP/1.1",
        r#"{"type": "Biometric Device"}"#,
    );
    let response = send_raw(port, &raw).await;
    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));

    let entries: serde_json::Value = serde_json::from_str(response_body(&response)).unwrap();
    let entries = entries.as_array().unwrap();
    assert_eq!(entries.len(), 5);
    for entry in entries {
        assert_eq!(entry["deviceStatus"], "Ready");
        assert_eq!(entry["purpose"], "Registration");
        assert!(!entry["digitalId"].as_str().unwrap().is_empty());
    }

    registry.stop_all();
}

#[tokio::test]
async fn discovery_without_type_reports_502() {
    let dir = tempfile::tempdir().unwrap();
    let registry = SbiRegistry::new();
    let port = registry.start("disc-502", test_config(dir.path())).await.unwrap();

    let raw = request_with_body("MOSIPDISC /device HTTP/1.1", r#"{"type": ""}"#);
    let response = send_raw(port, &raw).await;
    let entries: serde_json::Value = serde_json::from_str(response_body(&response)).unwrap();
    assert_eq!(entries[0]["error"]["errorCode"], "502");

    registry.stop_all();
}

#[tokio::test]
async fn device_info_returns_signed_blobs() {
    let dir = tempfile::tempdir().unwrap();
    let registry = SbiRegistry::new();
    let port = registry.start("info", test_config(dir.path())).await.unwrap();

    let response = send_raw(port, b"MOSIPDINFO /info HTTP/1.1\r\n\r\n").await;
    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
    let entries: serde_json::Value = serde_json::from_str(response_body(&response)).unwrap();
    let entries = entries.as_array().unwrap();
    assert_eq!(entries.len(), 5);
    for entry in entries {
        assert!(!entry["deviceInfo"].as_str().unwrap().is_empty());
        assert_eq!(entry["error"]["errorCode"], "100");
    }

    registry.stop_all();
}

#[tokio::test]
async fn empty_request_line_yields_a_405_json_response() {
    let dir = tempfile::tempdir().unwrap();
    let registry = SbiRegistry::new();
    let port = registry.start("empty", test_config(dir.path())).await.unwrap();

    let response = send_raw(port, b"\r\n").await;
    assert!(response.starts_with("HTTP/1.1 405 OK\r\n"));
    assert!(response.contains("Content-Type: application/json\r\n"));

    registry.stop_all();
}

#[tokio::test]
async fn unknown_verb_yields_a_405_response() {
    let dir = tempfile::tempdir().unwrap();
    let registry = SbiRegistry::new();
    let port = registry.start("unknown", test_config(dir.path())).await.unwrap();

    let response = send_raw(port, b"INFO /capture HTTP/1.1\r\n\r\n").await;
    assert!(response.starts_with("HTTP/1.1 405 OK\r\n"));
    assert!(response_body(&response).contains("\"errorCode\":\"500\""));

    registry.stop_all();
}

#[tokio::test]
async fn declared_method_must_match_the_transport_verb() {
    let dir = tempfile::tempdir().unwrap();
    let registry = SbiRegistry::new();
    let port = registry.start("mismatch", test_config(dir.path())).await.unwrap();

    let raw = request_with_body("MOSIPDINFO /info HTTP/1.1", r#"{"method": "CAPTURE"}"#);
    let response = send_raw(port, &raw).await;
    assert!(response.starts_with("HTTP/1.1 405 OK\r\n"));
    assert!(response_body(&response).contains("\"errorCode\":\"500\""));

    registry.stop_all();
}

#[tokio::test]
async fn options_preflight_gets_cors_headers() {
    let dir = tempfile::tempdir().unwrap();
    let registry = SbiRegistry::new();
    let port = registry.start("options", test_config(dir.path())).await.unwrap();

    let response = send_raw(port, b"OPTIONS /capture HTTP/1.1\r\n\r\n").await;
    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(response.contains("Access-Control-Allow-Origin: *\r\n"));
    assert!(response.contains("Connection: Keep-Alive\r\n"));

    registry.stop_all();
}

fn rcapture_body(device_id: &str, device_sub_id: u32, exceptions: &[&str]) -> String {
    serde_json::json!({
        "env": "Developer",
        "purpose": "Registration",
        "specVersion": "0.9.5",
        "timeout": 10000,
        "captureTime": "2026-01-01T00:00:00.000Z",
        "transactionId": "txn-0001",
        "bio": [{
            "type": "Finger",
            "count": "4",
            "exception": exceptions,
            "requestedScore": 40,
            "deviceId": device_id,
            "deviceSubId": device_sub_id.to_string(),
            "previousHash": ""
        }]
    })
    .to_string()
}

#[tokio::test]
async fn rcapture_returns_signed_partial_results() {
    let dir = tempfile::tempdir().unwrap();
    // Two of the four left-hand samples exist.
    write_sample(dir.path(), "Default", "Left_Index.iso", b"iso-left-index");
    write_sample(dir.path(), "Default", "Left_Middle.iso", b"iso-left-middle");

    let registry = SbiRegistry::new();
    let port = registry.start("rcapture", test_config(dir.path())).await.unwrap();

    let body = rcapture_body("FS001", 1, &[]);
    let raw = request_with_body("RCAPTURE /capture HTTP/1.1", &body);
    let response = send_raw(port, &raw).await;
    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"), "{response}");

    let parsed: serde_json::Value = serde_json::from_str(response_body(&response)).unwrap();
    let biometrics = parsed["biometrics"].as_array().unwrap();
    assert_eq!(biometrics.len(), 4);

    let captured: Vec<_> = biometrics
        .iter()
        .filter(|b| !b["data"].as_str().unwrap().is_empty())
        .collect();
    let missing: Vec<_> = biometrics
        .iter()
        .filter(|b| b["data"].as_str().unwrap().is_empty())
        .collect();
    assert_eq!(captured.len(), 2);
    assert_eq!(missing.len(), 2);
    for entry in &captured {
        assert_eq!(entry["specVersion"], "0.9.5");
        assert!(!entry["hash"].as_str().unwrap().is_empty());
        assert_eq!(entry["error"]["errorCode"], "100");
    }
    for entry in &missing {
        assert_eq!(entry["error"]["errorCode"], "701");
        assert_eq!(entry["hash"], "");
    }

    registry.stop_all();
}

#[tokio::test]
async fn rcapture_excludes_excepted_slots() {
    let dir = tempfile::tempdir().unwrap();
    write_sample(dir.path(), "Default", "Left_Index.iso", b"iso-left-index");
    write_sample(dir.path(), "Default", "Left_Middle.iso", b"iso-left-middle");

    let registry = SbiRegistry::new();
    let port = registry.start("exceptions", test_config(dir.path())).await.unwrap();

    let body = rcapture_body("FS001", 1, &["Left IndexFinger"]);
    let raw = request_with_body("RCAPTURE /capture HTTP/1.1", &body);
    let response = send_raw(port, &raw).await;
    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"), "{response}");

    let parsed: serde_json::Value = serde_json::from_str(response_body(&response)).unwrap();
    let biometrics = parsed["biometrics"].as_array().unwrap();
    // The excepted slot produces no entry at all: one captured (middle)
    // plus two missing (ring, little).
    assert_eq!(biometrics.len(), 3);
    let captured: Vec<_> = biometrics
        .iter()
        .filter(|b| !b["data"].as_str().unwrap().is_empty())
        .collect();
    assert_eq!(captured.len(), 1);

    registry.stop_all();
}

#[tokio::test]
async fn rcapture_with_missing_required_fields_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let registry = SbiRegistry::new();
    let port = registry.start("invalid", test_config(dir.path())).await.unwrap();

    // Missing transactionId.
    let body = serde_json::json!({
        "env": "Developer",
        "purpose": "Registration",
        "specVersion": "0.9.5",
        "timeout": 10000,
        "captureTime": "2026-01-01T00:00:00.000Z",
        "bio": [{"type": "Finger", "deviceId": "FS001", "deviceSubId": "1"}]
    })
    .to_string();
    let raw = request_with_body("RCAPTURE /capture HTTP/1.1", &body);
    let response = send_raw(port, &raw).await;
    assert!(response.starts_with("HTTP/1.1 405 OK\r\n"));

    let parsed: serde_json::Value = serde_json::from_str(response_body(&response)).unwrap();
    assert_eq!(parsed["biometrics"][0]["error"]["errorCode"], "707");

    registry.stop_all();
}

#[tokio::test]
async fn capture_verb_is_rejected_on_a_registration_device() {
    let dir = tempfile::tempdir().unwrap();
    let registry = SbiRegistry::new();
    let port = registry.start("wrong-purpose", test_config(dir.path())).await.unwrap();

    let body = rcapture_body("FS001", 1, &[]);
    let raw = request_with_body("CAPTURE /capture HTTP/1.1", &body);
    let response = send_raw(port, &raw).await;
    assert!(response.starts_with("HTTP/1.1 405 OK\r\n"));
    let parsed: serde_json::Value = serde_json::from_str(response_body(&response)).unwrap();
    assert_eq!(parsed["biometrics"][0]["error"]["errorCode"], "706");

    registry.stop_all();
}

#[tokio::test]
async fn admin_profile_respects_the_allow_list() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.settings.admin.allowed = vec!["status".to_string(), "score".to_string()];

    let registry = SbiRegistry::new();
    let port = registry.start("admin-deny", config).await.unwrap();

    let raw = request_with_body("POST /admin/profile HTTP/1.1", r#"{"profileId": "Stolen"}"#);
    let response = send_raw(port, &raw).await;
    assert!(response.starts_with("HTTP/1.1 405 OK\r\n"));
    assert!(response_body(&response).contains("\"errorCode\":\"709\""));

    // The prior profile is unchanged.
    let service = registry.get("admin-deny").unwrap();
    assert_eq!(service.shared_state().profile_id, "Default");

    registry.stop_all();
}

#[tokio::test]
async fn admin_profile_switches_the_active_profile() {
    let dir = tempfile::tempdir().unwrap();
    let registry = SbiRegistry::new();
    let port = registry.start("admin-profile", test_config(dir.path())).await.unwrap();

    let raw = request_with_body("POST /admin/profile HTTP/1.1", r#"{"profileId": "Profile2"}"#);
    let response = send_raw(port, &raw).await;
    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(response_body(&response).contains("\"errorCode\":\"0\""));

    let service = registry.get("admin-profile").unwrap();
    assert_eq!(service.shared_state().profile_id, "Profile2");

    registry.stop_all();
}

#[tokio::test]
async fn admin_score_updates_the_reported_quality() {
    let dir = tempfile::tempdir().unwrap();
    write_sample(dir.path(), "Default", "Left_Index.iso", b"iso-left-index");

    let registry = SbiRegistry::new();
    let port = registry.start("admin-score", test_config(dir.path())).await.unwrap();

    let raw = request_with_body("POST /admin/score HTTP/1.1", r#"{"qualityScore": "77"}"#);
    let response = send_raw(port, &raw).await;
    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));

    let body = rcapture_body("FS001", 1, &[]);
    let raw = request_with_body("RCAPTURE /capture HTTP/1.1", &body);
    let response = send_raw(port, &raw).await;
    let parsed: serde_json::Value = serde_json::from_str(response_body(&response)).unwrap();
    let data = parsed["biometrics"]
        .as_array()
        .unwrap()
        .iter()
        .find(|b| !b["data"].as_str().unwrap().is_empty())
        .unwrap()["data"]
        .as_str()
        .unwrap()
        .to_string();
    // Unsigned payloads are base64url JSON.
    let decoded = sbi_core::util::base64_url_decode(&data).unwrap();
    let block: serde_json::Value = serde_json::from_slice(&decoded).unwrap();
    assert_eq!(block["qualityScore"], "77");
    assert_eq!(block["bioSubType"], "Left IndexFinger");

    registry.stop_all();
}

#[tokio::test]
async fn stream_serves_mjpeg_frames() {
    let dir = tempfile::tempdir().unwrap();
    let device_dir = dir.path().join("devices").join("finger_slap");
    std::fs::create_dir_all(&device_dir).unwrap();
    std::fs::write(device_dir.join("stream_left.jpg"), b"jpeg-frame").unwrap();

    let registry = SbiRegistry::new();
    let port = registry.start("stream", test_config(dir.path())).await.unwrap();

    let body = r#"{"deviceId": "FS001", "deviceSubId": "1", "timeout": "120"}"#;
    let raw = request_with_body("STREAM /stream HTTP/1.1", body);
    let response = send_raw(port, &raw).await;
    assert!(response.starts_with("HTTP/1.0 200 OK\r\n"), "{response}");
    assert!(response.contains("multipart/x-mixed-replace; boundary=--BoundaryString"));
    assert!(response.contains("--BoundaryString\r\n"));
    assert!(response.contains("jpeg-frame"));

    registry.stop_all();
}

#[tokio::test]
async fn stream_without_device_id_reports_604() {
    let dir = tempfile::tempdir().unwrap();
    let registry = SbiRegistry::new();
    let port = registry.start("stream-604", test_config(dir.path())).await.unwrap();

    let raw = request_with_body("STREAM /stream HTTP/1.1", r#"{"deviceId": "", "deviceSubId": "1"}"#);
    let response = send_raw(port, &raw).await;
    assert!(response.starts_with("HTTP/1.1 405 OK\r\n"));
    assert!(response_body(&response).contains("\"errorCode\":\"604\""));

    registry.stop_all();
}

#[tokio::test]
async fn slow_client_hits_the_read_timeout() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.settings.server.read_timeout_ms = 200;

    let registry = SbiRegistry::new();
    let port = registry.start("slow", config).await.unwrap();

    let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
    stream
        .write_all(b"RCAPTURE /capture HTTP/1.1\r\nContent-Length: 50\r\n\r\n{\"partial\":")
        .await
        .unwrap();
    // Keep the connection open without ever completing the body.
    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    let response = String::from_utf8_lossy(&response);
    assert!(response.starts_with("HTTP/1.1 405 OK\r\n"), "{response}");
    assert!(response.contains("\"errorCode\":\"501\""));

    registry.stop_all();
}

#[tokio::test]
async fn delay_injection_slows_the_configured_verb() {
    let dir = tempfile::tempdir().unwrap();
    let registry = SbiRegistry::new();
    let port = registry.start("delay", test_config(dir.path())).await.unwrap();

    let raw = request_with_body(
        "POST /admin/delay HTTP/1.1",
        r#"{"delay": "300", "method": ["MOSIPDINFO"]}"#,
    );
    let response = send_raw(port, &raw).await;
    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));

    let start = std::time::Instant::now();
    let _ = send_raw(port, b"MOSIPDINFO /info HTTP/1.1\r\n\r\n").await;
    assert!(start.elapsed() >= std::time::Duration::from_millis(300));

    // Other verbs are unaffected.
    let start = std::time::Instant::now();
    let raw = request_with_body("MOSIPDISC /device HTTP/1.1", r#"{"type": "Finger"}"#);
    let _ = send_raw(port, &raw).await;
    assert!(start.elapsed() < std::time::Duration::from_millis(300));

    registry.stop_all();
}
