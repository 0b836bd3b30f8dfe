// 🌐 REST Client - the church backend's API, consumed over HTTP
//
// Every call:
// - asks the TokenSource for a fresh ID token (tokens refresh per call)
// - sends `Authorization: Bearer <token>` and an `X-Request-Id`
// - maps non-success responses to ApiError with the server's message
//
// There are no retries and no cancellation; the user resubmits.

mod error;
mod members;
mod messaging;
mod organization;
mod treasury;

pub use error::ApiError;

use crate::config::AppConfig;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

pub type ApiResult<T> = Result<T, ApiError>;

// ============================================================================
// TOKENS
// ============================================================================

/// Supplies the bearer ID token for each request
pub trait TokenSource: Send + Sync {
    fn id_token(&self) -> ApiResult<String>;
}

/// A token handed over once (CLI flag / environment)
#[derive(Debug, Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        StaticToken(token.into())
    }
}

impl TokenSource for StaticToken {
    fn id_token(&self) -> ApiResult<String> {
        if self.0.trim().is_empty() {
            return Err(ApiError::Token("no ID token configured".to_string()));
        }
        Ok(self.0.clone())
    }
}

// ============================================================================
// CLIENT
// ============================================================================

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenSource>,
}

impl ApiClient {
    pub fn new(config: &AppConfig, tokens: Arc<dyn TokenSource>) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;
        Ok(Self::with_http(http, &config.base_url, tokens))
    }

    /// Reuse an existing reqwest client (the view server shares one pool)
    pub fn with_http(http: reqwest::Client, base_url: &str, tokens: Arc<dyn TokenSource>) -> Self {
        ApiClient {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
        }
    }

    /// Same connection pool and base URL, different caller
    pub fn for_token(&self, tokens: Arc<dyn TokenSource>) -> Self {
        ApiClient {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            tokens,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn headers(&self) -> ApiResult<HeaderMap> {
        let token = self.tokens.id_token()?;
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| ApiError::Token(format!("invalid token characters: {e}")))?;
        headers.insert(AUTHORIZATION, auth);
        let request_id = uuid::Uuid::new_v4().to_string();
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            headers.insert("x-request-id", value);
        }
        Ok(headers)
    }

    /// Send one request and return the decoded JSON body (Null when empty)
    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> ApiResult<Value> {
        let url = self.url(path);
        let mut request = self
            .http
            .request(method.clone(), &url)
            .headers(self.headers()?);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        debug!(%method, %url, "api request");
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            warn!(%method, %url, status = status.as_u16(), "api request failed");
            return Err(ApiError::from_response(status.as_u16(), &text));
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| ApiError::Decode(format!("{url}: {e}")))
    }

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        key: Option<&str>,
    ) -> ApiResult<T> {
        let body = self.send::<()>(Method::GET, path, query, None).await?;
        decode_body(body, key)
    }

    pub(crate) async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        key: Option<&str>,
    ) -> ApiResult<T> {
        let value = self.send(Method::POST, path, &[], Some(body)).await?;
        decode_body(value, key)
    }

    pub(crate) async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        key: Option<&str>,
    ) -> ApiResult<T> {
        let value = self.send(Method::PUT, path, &[], Some(body)).await?;
        decode_body(value, key)
    }

    /// Requests whose response body is not needed
    pub(crate) async fn send_no_content(&self, method: Method, path: &str) -> ApiResult<()> {
        self.send::<()>(method, path, &[], None).await.map(|_| ())
    }
}

/// Percent-encode one path segment
pub(crate) fn segment(raw: &str) -> String {
    urlencoding::encode(raw).into_owned()
}

/// Unwrap the backend's assorted envelopes:
/// `{"data": ...}`, `{"<key>": ...}`, `{"success": true, "data": {"<key>": ...}}`
/// or the bare value.
pub(crate) fn decode_body<T: DeserializeOwned>(mut body: Value, key: Option<&str>) -> ApiResult<T> {
    if let Some(data) = body.get_mut("data").map(Value::take) {
        body = data;
    }
    if let Some(key) = key {
        if let Some(inner) = body.get_mut(key).map(Value::take) {
            body = inner;
        }
    }
    serde_json::from_value(body).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Non-critical lookups fail open: log and carry on with the permissive default
pub fn fail_open<T: Default>(what: &str, result: ApiResult<T>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => {
            warn!(lookup = what, error = %err, "lookup failed; continuing without it");
            T::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Member;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// One-shot HTTP responder; yields the raw request head it received
    async fn serve_once(status: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 8192];
            let mut head = Vec::new();
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                head.extend_from_slice(&buf[..n]);
                if head.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&head).to_string()
        });
        (format!("http://{addr}"), handle)
    }

    fn client(base: &str, token: &str) -> ApiClient {
        ApiClient::with_http(reqwest::Client::new(), base, Arc::new(StaticToken::new(token)))
    }

    #[test]
    fn test_url_joining() {
        let c = client("http://api.local/", "t");
        assert_eq!(c.url("/api/members"), "http://api.local/api/members");
        assert_eq!(c.url("api/members"), "http://api.local/api/members");
        assert_eq!(segment("a b/c"), "a%20b%2Fc");
    }

    #[test]
    fn test_decode_body_envelopes() {
        let wrapped = serde_json::json!({"success": true, "data": {"members": [1, 2]}});
        let list: Vec<u32> = decode_body(wrapped, Some("members")).unwrap();
        assert_eq!(list, vec![1, 2]);

        let bare = serde_json::json!([3]);
        let list: Vec<u32> = decode_body(bare, Some("members")).unwrap();
        assert_eq!(list, vec![3]);

        let keyed = serde_json::json!({"members": [4]});
        let list: Vec<u32> = decode_body(keyed, Some("members")).unwrap();
        assert_eq!(list, vec![4]);
    }

    #[test]
    fn test_fail_open_defaults() {
        let failed: ApiResult<Vec<u8>> = Err(ApiError::Decode("boom".to_string()));
        assert!(fail_open("vendors", failed).is_empty());
        assert!(!fail_open("phone check", Ok::<bool, ApiError>(false)));
    }

    #[test]
    fn test_empty_token_rejected() {
        assert!(matches!(StaticToken::new(" ").id_token(), Err(ApiError::Token(_))));
    }

    #[tokio::test]
    async fn test_get_sends_bearer_and_decodes() {
        let (base, server) = serve_once(
            "200 OK",
            r#"{"members": [{"id": 1, "firstName": "Abebe", "lastName": "Kebede"}]}"#,
        )
        .await;

        let members: Vec<Member> = client(&base, "secret-token")
            .get("/api/members", &[], Some("members"))
            .await
            .unwrap();

        assert_eq!(members.len(), 1);
        assert_eq!(members[0].full_name(), "Abebe Kebede");

        let head = server.await.unwrap().to_lowercase();
        assert!(head.starts_with("get /api/members"));
        assert!(head.contains("authorization: bearer secret-token"));
        assert!(head.contains("x-request-id: "));
    }

    #[tokio::test]
    async fn test_error_status_carries_server_message() {
        let (base, server) = serve_once("409 Conflict", r#"{"message": "Phone already registered"}"#).await;

        let result: ApiResult<Value> = client(&base, "t").get("/api/members", &[], None).await;
        let err = result.unwrap_err();
        assert_eq!(err.banner(), "Phone already registered");
        server.await.unwrap();
    }
}
