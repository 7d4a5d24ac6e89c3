#![allow(dead_code)]

use image::{Rgba, RgbaImage};
use parking_lot::Mutex;
use shake_report::jira::{HttpRequest, HttpResponse, HttpTransport, TransportError};
use shake_report::{DeviceMetadata, ReporterConfig};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

pub type RequestLog = Arc<Mutex<Vec<HttpRequest>>>;

/// Replays canned responses in order and records every request.
/// Runs out with a 500.
pub struct StubTransport {
    responses: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    log: RequestLog,
    delay: Duration,
}

impl StubTransport {
    pub fn new(responses: Vec<HttpResponse>) -> (Self, RequestLog) {
        Self::with_results(responses.into_iter().map(Ok).collect())
    }

    pub fn with_results(responses: Vec<Result<HttpResponse, TransportError>>) -> (Self, RequestLog) {
        let log = RequestLog::default();
        let transport = Self {
            responses: Mutex::new(responses.into()),
            log: Arc::clone(&log),
            delay: Duration::ZERO,
        };
        (transport, log)
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl HttpTransport for StubTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.log.lock().push(request.clone());
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(HttpResponse::new(500, "no canned response")))
    }
}

pub fn json(status: u16, body: serde_json::Value) -> HttpResponse {
    HttpResponse::new(status, serde_json::to_vec(&body).unwrap())
}

pub fn created(key: &str) -> HttpResponse {
    json(201, serde_json::json!({ "id": "10001", "key": key, "self": "https://acme.atlassian.net/rest/api/3/issue/10001" }))
}

pub fn attached() -> HttpResponse {
    json(200, serde_json::json!([{ "filename": "screenshot.jpg" }]))
}

pub fn project() -> HttpResponse {
    json(200, serde_json::json!({ "id": "10000", "key": "PROJ" }))
}

pub fn createmeta(types: &[(&str, &str)]) -> HttpResponse {
    let issuetypes: Vec<_> = types
        .iter()
        .map(|(name, id)| serde_json::json!({ "name": name, "id": id }))
        .collect();
    json(200, serde_json::json!({ "projects": [{ "id": "10000", "issuetypes": issuetypes }] }))
}

pub fn config() -> ReporterConfig {
    ReporterConfig::new("acme", "dev@acme.io", "s3cret", "PROJ")
}

pub fn metadata() -> DeviceMetadata {
    DeviceMetadata {
        model: "Test Device".to_string(),
        os_version: "TestOS 1.0".to_string(),
        app_version: "2.3.1".to_string(),
        build: "118".to_string(),
        locale: "en_US".to_string(),
        timezone: "+00:00".to_string(),
        free_disk_bytes: Some(64_000_000_000),
        battery: None,
        uptime: Duration::from_secs(7200),
    }
}

pub fn screenshot(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba([240, 240, 240, 255]))
}
