#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use alt_text_lib::VisionConfig;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

pub const COMPLETIONS_PATH: &str = "/v1/chat/completions";

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone)]
struct Route {
    method: String,
    path: String,
    status: u16,
    content_type: Option<String>,
    body: String,
}

/// 요청을 기록하고 고정 응답을 돌려주는 로컬 HTTP 서버
pub struct FakeServer {
    base: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

#[derive(Default)]
pub struct FakeServerBuilder {
    routes: Vec<Route>,
}

impl FakeServerBuilder {
    pub fn route(
        mut self,
        method: &str,
        path: &str,
        status: u16,
        content_type: Option<&str>,
        body: impl Into<String>,
    ) -> Self {
        self.routes.push(Route {
            method: method.to_string(),
            path: path.to_string(),
            status,
            content_type: content_type.map(str::to_string),
            body: body.into(),
        });
        self
    }

    /// HEAD 200 + image/* 응답
    pub fn image(self, path: &str, content_type: &str) -> Self {
        self.route("HEAD", path, 200, Some(content_type), "")
    }

    /// Chat Completions 응답 (본문 그대로)
    pub fn completion(self, status: u16, body: impl Into<String>) -> Self {
        self.route("POST", COMPLETIONS_PATH, status, Some("application/json"), body)
    }

    /// `choices[0].message.content`에 text를 담은 정상 응답
    pub fn completion_text(self, text: &str) -> Self {
        let body = serde_json::json!({
            "id": "chatcmpl-test",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": text },
                "finish_reason": "stop"
            }]
        });
        self.completion(200, body.to_string())
    }

    pub async fn start(self) -> FakeServer {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind listener");
        let addr = listener.local_addr().expect("addr");
        let requests = Arc::new(Mutex::new(Vec::new()));

        let routes = Arc::new(self.routes);
        let requests_bg = Arc::clone(&requests);
        tokio::spawn(async move {
            loop {
                let (stream, _) = match listener.accept().await {
                    Ok(v) => v,
                    Err(_) => break,
                };
                let routes = Arc::clone(&routes);
                let requests = Arc::clone(&requests_bg);
                tokio::spawn(async move {
                    serve_one(stream, &routes, &requests).await;
                });
            }
        });

        FakeServer {
            base: format!("http://{}", addr),
            requests,
        }
    }
}

impl FakeServer {
    pub fn builder() -> FakeServerBuilder {
        FakeServerBuilder::default()
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// 서버를 Vision API 엔드포인트로 쓰는 설정
    pub fn vision_config(&self) -> VisionConfig {
        VisionConfig {
            endpoint: self.url(COMPLETIONS_PATH),
            timeout: Duration::from_secs(5),
            ..Default::default()
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().expect("requests lock").clone()
    }

    pub fn requests_to(&self, method: &str, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path == path)
            .collect()
    }
}

/// 시스템 프록시 설정의 영향을 받지 않는 클라이언트
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(5))
        .build()
        .expect("http client")
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n").map(|p| p + 4)
}

async fn serve_one(
    mut stream: TcpStream,
    routes: &[Route],
    requests: &Mutex<Vec<RecordedRequest>>,
) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);
        if let Some(end) = find_header_end(&buf) {
            break end;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.lines();
    let first = lines.next().unwrap_or_default().to_string();
    let mut parts = first.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let path = parts.next().unwrap_or_default().to_string();

    let headers: Vec<(String, String)> = lines
        .filter_map(|l| l.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();
    let content_length = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);
    }
    let body_end = buf.len().min(header_end + content_length);
    let body = String::from_utf8_lossy(&buf[header_end..body_end]).to_string();

    requests.lock().expect("requests lock").push(RecordedRequest {
        method: method.clone(),
        path: path.clone(),
        headers,
        body,
    });

    let route = routes
        .iter()
        .find(|r| r.method == method && r.path == path)
        .cloned()
        .unwrap_or(Route {
            method,
            path,
            status: 404,
            content_type: Some("text/plain".to_string()),
            body: "not found".to_string(),
        });

    let is_head = route.method == "HEAD";
    let mut response = format!("HTTP/1.1 {} Fake\r\n", route.status);
    if let Some(ct) = &route.content_type {
        response.push_str(&format!("Content-Type: {}\r\n", ct));
    }
    let length = if is_head { 0 } else { route.body.len() };
    response.push_str(&format!("Content-Length: {}\r\nConnection: close\r\n\r\n", length));
    if !is_head {
        response.push_str(&route.body);
    }

    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}
