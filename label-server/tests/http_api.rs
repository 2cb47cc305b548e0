use axum::Router;
use axum::body::Body;
use http::{Request, StatusCode};
use http_body_util::BodyExt;
use label_server::api::build_router;
use label_server::{Config, ServerState};
use std::path::PathBuf;
use tempfile::TempDir;
use tower::ServiceExt;

struct TestServer {
    _dir: TempDir,
    device: PathBuf,
    profile_path: PathBuf,
    router: Router,
}

impl TestServer {
    async fn start() -> Self {
        Self::start_with(|_| {}, true).await
    }

    /// Server over a temp profile; `with_device` creates the device node
    async fn start_with(tweak: impl FnOnce(&mut Config), with_device: bool) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let device = dir.path().join("lp0");
        if with_device {
            std::fs::write(&device, b"").unwrap();
        }
        Self::start_on(dir, device, tweak).await
    }

    /// Server writing to an existing device path
    async fn start_on(dir: TempDir, device: PathBuf, tweak: impl FnOnce(&mut Config)) -> Self {
        let profile_path = dir.path().join("printer_profile.json");
        std::fs::write(
            &profile_path,
            serde_json::json!({ "device_path": device }).to_string(),
        )
        .unwrap();

        let mut config = Config::with_overrides(dir.path().display().to_string(), &profile_path);
        tweak(&mut config);
        let state = ServerState::initialize(&config).await.unwrap();

        Self {
            router: build_router(state),
            _dir: dir,
            device,
            profile_path,
        }
    }

    async fn request(&self, method: &str, uri: &str, body: impl Into<Body>) -> (StatusCode, Vec<u8>) {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .body(body.into())
            .unwrap();
        let resp = self.router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let body = resp.into_body().collect().await.unwrap().to_bytes().to_vec();
        (status, body)
    }

    async fn post(&self, uri: &str, body: impl Into<Body>) -> (StatusCode, Vec<u8>) {
        self.request("POST", uri, body).await
    }

    fn written(&self) -> Vec<u8> {
        std::fs::read(&self.device).unwrap()
    }

    fn written_lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.written())
            .lines()
            .map(str::to_string)
            .collect()
    }
}

fn keyword(line: &str) -> &str {
    line.split([' ', ',']).next().unwrap_or("")
}

#[tokio::test]
async fn test_raw_command_is_written_unchanged() {
    let server = TestServer::start().await;

    let (status, body) = server.post("/raw", "PRINT 1,1").await;
    assert_eq!(status, StatusCode::OK, "{}", String::from_utf8_lossy(&body));
    assert_eq!(server.written(), b"PRINT 1,1");
    assert_eq!(String::from_utf8(body).unwrap(), "printed raw (9 bytes)\n");
}

#[tokio::test]
async fn test_missing_device_is_service_unavailable() {
    let server = TestServer::start_with(|_| {}, false).await;

    let (status, body) = server.post("/raw", "PRINT 1,1").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(String::from_utf8(body).unwrap().starts_with("error: "));
    assert!(!server.device.exists());
}

#[tokio::test]
async fn test_failed_device_write_is_bad_gateway() {
    let full = PathBuf::from("/dev/full");
    if !full.exists() {
        return;
    }
    let server = TestServer::start_on(tempfile::tempdir().unwrap(), full, |_| {}).await;

    let (status, body) = server.post("/raw", "PRINT 1,1").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(String::from_utf8(body).unwrap().starts_with("error: "));
}

#[tokio::test]
async fn test_plain_text_label() {
    let server = TestServer::start().await;

    let (status, _) = server.post("/print", "Line 1\nLine 2\nLine 3\n").await;
    assert_eq!(status, StatusCode::OK);

    let lines = server.written_lines();
    let count = |kw: &str| lines.iter().filter(|l| keyword(l) == kw).count();
    assert_eq!(count("CLS"), 1);
    assert_eq!(count("PRINT"), 1);

    let texts: Vec<&String> = lines.iter().filter(|l| keyword(l) == "TEXT").collect();
    assert_eq!(texts.len(), 3);
    for (text, expected) in texts.iter().zip(["Line 1", "Line 2", "Line 3"]) {
        assert!(text.ends_with(&format!("\"{}\"", expected)), "{}", text);
    }
    assert_eq!(lines.last().map(String::as_str), Some("PRINT 1,1"));
}

#[tokio::test]
async fn test_shipping_label() {
    let server = TestServer::start().await;

    let (status, _) = server
        .post("/shipping", "54321|Jane Doe|123 Oak Ave, Detroit|ORDER54321")
        .await;
    assert_eq!(status, StatusCode::OK);

    let lines = server.written_lines();
    let barcodes: Vec<&String> = lines.iter().filter(|l| keyword(l) == "BARCODE").collect();
    assert_eq!(barcodes.len(), 1);
    assert!(barcodes[0].ends_with("\"ORDER54321\""));

    let order_texts = lines
        .iter()
        .filter(|l| keyword(l) == "TEXT" && l.contains("54321"))
        .count();
    assert_eq!(order_texts, 1);
}

#[tokio::test]
async fn test_malformed_bodies_never_reach_the_device() {
    let server = TestServer::start().await;

    let (status, _) = server.post("/shipping", "54321|Jane Doe").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = server.post("/packing", "54321|Jane Doe| , ").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = server.post("/image", "not base64!!").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // valid base64, not an image
    let (status, _) = server.post("/image", "aGVsbG8gd29ybGQ=").await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);

    assert!(server.written().is_empty());
}

#[tokio::test]
async fn test_oversized_raw_body() {
    let server = TestServer::start_with(|c| c.max_raw_bytes = 16, true).await;

    let (status, _) = server.post("/raw", vec![b'A'; 17]).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(server.written().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_jobs_do_not_interleave() {
    const JOBS: u8 = 8;
    const LEN: usize = 64 * 1024;
    let server = TestServer::start().await;

    let mut handles = Vec::new();
    for i in 0..JOBS {
        let router = server.router.clone();
        handles.push(tokio::spawn(async move {
            let req = Request::builder()
                .method("POST")
                .uri("/raw")
                .body(Body::from(vec![b'a' + i; LEN]))
                .unwrap();
            router.oneshot(req).await.unwrap().status()
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap(), StatusCode::OK);
    }

    let written = server.written();
    assert_eq!(written.len(), JOBS as usize * LEN);
    let mut seen = Vec::new();
    for chunk in written.chunks(LEN) {
        assert!(chunk.iter().all(|&b| b == chunk[0]), "job bytes interleaved");
        seen.push(chunk[0]);
    }
    seen.sort_unstable();
    seen.dedup();
    assert_eq!(seen.len(), JOBS as usize);
}

#[tokio::test]
async fn test_profile_update_and_nudge() {
    let server = TestServer::start().await;

    let (status, body) = server.request("GET", "/api/config", Body::empty()).await;
    assert_eq!(status, StatusCode::OK);
    let profile: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(profile["x_offset"], 32);
    assert_eq!(profile["label_width_mm"], 101.6);

    let (status, body) = server
        .post("/api/config", r#"{ "x_offset": 10, "label_height_mm": 50.8 }"#)
        .await;
    assert_eq!(status, StatusCode::OK, "{}", String::from_utf8_lossy(&body));
    let profile: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(profile["x_offset"], 10);
    assert_eq!(profile["label_height_mm"], 50.8);

    let (status, body) = server.post("/api/nudge", r#"{ "axis": "x", "mm": -1.5 }"#).await;
    assert_eq!(status, StatusCode::OK);
    let profile: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(profile["x_offset"], -2);

    let (status, body) = server.post("/api/nudge", r#"{ "axis": "y", "mm": 100 }"#).await;
    assert_eq!(status, StatusCode::OK);
    let profile: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(profile["y_offset"], 300);

    // persisted, previous version kept
    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&server.profile_path).unwrap()).unwrap();
    assert_eq!(saved["y_offset"], 300);
    assert!(server.profile_path.with_extension("json.bak").exists());

    // the next label uses the new size
    server.post("/print", "hello").await;
    assert!(server.written_lines()[0].starts_with("SIZE 101.6 mm,50.8 mm"));
}

#[tokio::test]
async fn test_invalid_profile_update_changes_nothing() {
    let server = TestServer::start().await;

    let (status, _) = server.post("/api/config", r#"{ "dpi": 300 }"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = server.post("/api/config", r#"{ "x_offset": "left" }"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = server
        .post("/api/config", r#"{ "label_width_mm": 268435455.0 }"#)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = server.post("/api/config", r#"{ "density": 16 }"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = server.post("/api/config", "[1, 2]").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = server.post("/api/nudge", r#"{ "axis": "z", "mm": 1 }"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = server.request("GET", "/api/config", Body::empty()).await;
    let profile: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(profile["dpi"], 203);
    assert_eq!(profile["x_offset"], 32);
    assert_eq!(profile["label_width_mm"], 101.6);
}

#[tokio::test]
async fn test_maintenance_commands() {
    let server = TestServer::start().await;

    let (status, _) = server.post("/api/print-test/zigzag", Body::empty()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(server.written().is_empty());

    let (status, body) = server.post("/api/print-test/border", Body::empty()).await;
    assert_eq!(status, StatusCode::OK);
    let resp: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(resp["ok"], true);
    assert_eq!(resp["action"], "border");
    assert!(server.written_lines().iter().any(|l| keyword(l) == "BOX"));

    let before = server.written().len();
    let (status, body) = server.post("/api/feed", Body::empty()).await;
    assert_eq!(status, StatusCode::OK);
    let resp: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(resp["action"], "feed");
    assert_eq!(resp["bytes"].as_u64().unwrap() as usize, server.written().len() - before);
    assert!(server.written_lines().iter().any(|l| l == "FEED 1219"));

    let (status, _) = server.post("/api/feed", r#"{ "action": "calibrate" }"#).await;
    assert_eq!(status, StatusCode::OK);
    assert!(server.written_lines().iter().any(|l| l == "GAPDETECT"));

    let (status, _) = server.post("/api/feed", r#"{ "action": "spin" }"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health_and_banner() {
    let server = TestServer::start().await;

    let (status, body) = server.request("GET", "/health", Body::empty()).await;
    assert_eq!(status, StatusCode::OK);
    let health: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["device"], "connected");
    assert_eq!(health["device_path"], server.device.display().to_string());

    let (status, body) = server.request("GET", "/", Body::empty()).await;
    assert_eq!(status, StatusCode::OK);
    let banner = String::from_utf8(body).unwrap();
    assert!(banner.contains("Label: 101.6x152.4mm"));
    assert!(banner.contains("Offsets: X=32 Y=0"));
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let server = TestServer::start().await;

    let req = Request::builder()
        .uri("/health")
        .header("x-request-id", "job-7")
        .body(Body::empty())
        .unwrap();
    let resp = server.router.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.headers()["x-request-id"], "job-7");

    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let resp = server.router.clone().oneshot(req).await.unwrap();
    assert!(resp.headers().contains_key("x-request-id"));
}
