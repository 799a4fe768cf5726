use modelscan::cache::ScanCache;
use modelscan::scanner::WalkerConfig;
use modelscan::service::jsonl::{dispatch, serve};
use modelscan::service::{ScanRequest, ScanService, ServiceError};
use serde_json::Value;
use std::fs;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

fn service_with_ttl(ttl: Duration) -> ScanService {
    ScanService::new(Arc::new(ScanCache::new(ttl)), WalkerConfig::default())
}

fn scan_line(path: &std::path::Path) -> String {
    serde_json::json!({"op": "scan", "path": path}).to_string()
}

#[test]
fn test_scan_response_shape() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.safetensors"), vec![0u8; 100]).unwrap();
    fs::write(dir.path().join("notes.txt"), b"x").unwrap();
    let service = service_with_ttl(Duration::from_secs(300));

    let (line, status) = dispatch(&service, &scan_line(dir.path()), false);
    assert_eq!(status, 200);

    let value: Value = serde_json::from_str(&line).unwrap();
    assert_eq!(value["code"], 200);
    assert_eq!(value["total"], 1);
    assert_eq!(value["cached"], false);
    let file = &value["files"][0];
    assert_eq!(file["name"], "a.safetensors");
    assert_eq!(file["size"], 100);
    assert!(file["path"].as_str().unwrap().ends_with("a.safetensors"));
    assert!(file["modified"].is_string());
}

#[test]
fn test_second_scan_is_cached_until_change() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.gguf"), b"q4").unwrap();
    let service = service_with_ttl(Duration::from_secs(300));
    let request = ScanRequest {
        path: Some(dir.path().to_string_lossy().into_owned()),
    };

    assert!(!service.scan(&request).unwrap().cached);
    assert!(service.scan(&request).unwrap().cached);

    fs::write(dir.path().join("b.gguf"), b"q8").unwrap();
    let rescanned = service.scan(&request).unwrap();
    assert!(!rescanned.cached);
    assert_eq!(rescanned.total, 2);
}

#[test]
fn test_zero_ttl_never_caches() {
    let dir = tempdir().unwrap();
    let service = service_with_ttl(Duration::ZERO);
    let request = ScanRequest {
        path: Some(dir.path().to_string_lossy().into_owned()),
    };

    assert!(!service.scan(&request).unwrap().cached);
    assert!(!service.scan(&request).unwrap().cached);
}

#[test]
fn test_missing_path_is_404() {
    let service = service_with_ttl(Duration::from_secs(300));
    let (line, status) = dispatch(
        &service,
        r#"{"op":"scan","path":"/nonexistent/modelscan/jsonl"}"#,
        false,
    );
    assert_eq!(status, 404);
    let value: Value = serde_json::from_str(&line).unwrap();
    assert_eq!(value["error"], "Path does not exist: /nonexistent/modelscan/jsonl");

    let err = service
        .scan(&ScanRequest {
            path: Some("/nonexistent/modelscan/jsonl".into()),
        })
        .unwrap_err();
    assert!(matches!(err, ServiceError::PathNotFound(_)));
}

#[test]
fn test_serve_session() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("m.pt"), b"x").unwrap();
    let service = service_with_ttl(Duration::from_secs(300));

    let input = [
        scan_line(dir.path()),
        scan_line(dir.path()),
        r#"{"op":"health"}"#.to_string(),
        serde_json::json!({"op": "clear_cache", "path": dir.path()}).to_string(),
        r#"{"op":"health"}"#.to_string(),
        r#"{"op":"scan"}"#.to_string(),
    ]
    .join("\n");
    let mut out = Vec::new();

    let summary = serve(&service, Cursor::new(input), &mut out, None, false).unwrap();
    assert_eq!(summary.requests, 6);
    assert_eq!(summary.errors, 1);

    let replies: Vec<Value> = String::from_utf8(out)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(replies[0]["cached"], false);
    assert_eq!(replies[1]["cached"], true);
    assert_eq!(replies[2]["cache_size"], 1);
    assert_eq!(replies[2]["code"], 200);
    assert_eq!(replies[2]["status"], "healthy");
    assert!(replies[3]["message"]
        .as_str()
        .unwrap()
        .starts_with("Cleared cache for path: "));
    assert_eq!(replies[4]["cache_size"], 0);
    assert_eq!(replies[5]["code"], 400);
}
