//! HTTP transport layer for the Trello SDK.

use crate::config::ClientConfig;
use crate::dispatcher::Dispatcher;
use crate::error::{TrelloError, TrelloResult};
use crate::rate_limit::DualLimiter;
use reqwest::{header, Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tracing::debug;

/// HTTP transport for making API requests.
///
/// Every request carries the `key`/`token` query parameters and goes through
/// the [`Dispatcher`], so it is subject to local admission and 429 retries.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    config: Arc<ClientConfig>,
    dispatcher: Dispatcher,
}

impl HttpTransport {
    /// Create a new HTTP transport with the given configuration.
    pub fn new(config: Arc<ClientConfig>) -> TrelloResult<Self> {
        let limiter = Arc::new(DualLimiter::new(&config.rate_limit));
        Self::with_limiter(config, limiter)
    }

    /// Create a transport sharing an existing limiter.
    pub fn with_limiter(config: Arc<ClientConfig>, limiter: Arc<DualLimiter>) -> TrelloResult<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("trello-mcp/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()?;

        let dispatcher = Dispatcher::new(limiter, config.retry_config.clone());

        Ok(Self {
            client,
            config,
            dispatcher,
        })
    }

    pub fn limiter(&self) -> &Arc<DualLimiter> {
        self.dispatcher.limiter()
    }

    /// Build a URL for the given path, relative to the API root.
    fn build_url(&self, path: &str) -> TrelloResult<url::Url> {
        self.config
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(TrelloError::InvalidUrl)
    }

    fn authenticated(&self, request: RequestBuilder) -> RequestBuilder {
        request.query(&[
            ("key", self.config.api_key.as_str()),
            ("token", self.config.token.as_str()),
        ])
    }

    /// Send a request through the dispatcher and decode the JSON body.
    async fn execute<T: DeserializeOwned>(&self, request_builder: RequestBuilder) -> TrelloResult<T> {
        let request_builder = self.authenticated(request_builder);

        self.dispatcher
            .send(|| {
                let request = request_builder.try_clone();
                async move {
                    let request = request
                        .ok_or_else(|| TrelloError::Config("Request cannot be cloned".to_string()))?;
                    let response = request.send().await.map_err(|e| {
                        if e.is_timeout() {
                            TrelloError::Timeout
                        } else {
                            TrelloError::Http(e)
                        }
                    })?;
                    Self::decode(response).await
                }
            })
            .await
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> TrelloResult<T> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let retry_after_secs = response
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        let body = response.text().await.unwrap_or_default();
        debug!(status = status.as_u16(), "Trello returned an error response");
        Err(TrelloError::from_response(status.as_u16(), &body, retry_after_secs))
    }

    /// Execute a GET request.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> TrelloResult<T> {
        let url = self.build_url(path)?;
        debug!(path = %url.path(), "GET request");

        self.execute(self.client.get(url)).await
    }

    /// Execute a GET request with query parameters.
    pub async fn get_with_query<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> TrelloResult<T> {
        let url = self.build_url(path)?;
        debug!(path = %url.path(), "GET request with query");

        self.execute(self.client.get(url).query(query)).await
    }

    /// Execute a POST request with a JSON body.
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> TrelloResult<T> {
        let url = self.build_url(path)?;
        debug!(path = %url.path(), "POST request");

        self.execute(self.client.post(url).json(body)).await
    }

    /// Execute a PUT request with a JSON body.
    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> TrelloResult<T> {
        let url = self.build_url(path)?;
        debug!(path = %url.path(), "PUT request");

        self.execute(self.client.put(url).json(body)).await
    }

    /// Execute a PUT request with query parameters and no body.
    pub async fn put_with_query<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> TrelloResult<T> {
        let url = self.build_url(path)?;
        debug!(path = %url.path(), "PUT request with query");

        self.execute(self.client.put(url).query(query)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetryConfig;
    use serde::{Deserialize, Serialize};
    use std::time::Duration;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct TestResponse {
        id: String,
        name: String,
    }

    fn create_config(base_url: &str, retry_config: RetryConfig) -> Arc<ClientConfig> {
        let mut config = ClientConfig::new(
            url::Url::parse(&format!("{}/1/", base_url)).unwrap(),
            "test-key",
            "test-token",
        );
        config.retry_config = retry_config;
        Arc::new(config)
    }

    fn fast_retry() -> RetryConfig {
        RetryConfig {
            max_retries: 2,
            initial_backoff: Duration::from_millis(10),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_get_sends_credentials() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/1/boards/b1"))
            .and(query_param("key", "test-key"))
            .and(query_param("token", "test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(TestResponse {
                id: "b1".to_string(),
                name: "Roadmap".to_string(),
            }))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(create_config(&server.uri(), RetryConfig::no_retry())).unwrap();

        let result: TestResponse = transport.get("boards/b1").await.unwrap();
        assert_eq!(result.name, "Roadmap");
        assert_eq!(transport.limiter().snapshot().token_tokens, 99);
    }

    #[tokio::test]
    async fn test_post_json_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/1/lists"))
            .and(body_json(serde_json::json!({"name": "Doing", "idBoard": "b1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(TestResponse {
                id: "l1".to_string(),
                name: "Doing".to_string(),
            }))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(create_config(&server.uri(), RetryConfig::no_retry())).unwrap();

        let result: TestResponse = transport
            .post("lists", &serde_json::json!({"name": "Doing", "idBoard": "b1"}))
            .await
            .unwrap();
        assert_eq!(result.id, "l1");
    }

    #[tokio::test]
    async fn test_retries_after_429() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/1/members/me"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": "API_TOKEN_LIMIT_EXCEEDED",
                "message": "Rate limit exceeded"
            })))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/1/members/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(TestResponse {
                id: "m1".to_string(),
                name: "ada".to_string(),
            }))
            .expect(1)
            .mount(&server)
            .await;

        let transport = HttpTransport::new(create_config(&server.uri(), fast_retry())).unwrap();

        let result: TestResponse = transport.get("members/me").await.unwrap();
        assert_eq!(result.id, "m1");
    }

    #[tokio::test]
    async fn test_persistent_429_gives_up() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/1/members/me"))
            .respond_with(ResponseTemplate::new(429))
            .expect(3)
            .mount(&server)
            .await;

        let transport = HttpTransport::new(create_config(&server.uri(), fast_retry())).unwrap();

        let result: TrelloResult<TestResponse> = transport.get("members/me").await;
        assert!(matches!(result, Err(TrelloError::RateLimitExhausted { attempts: 3 })));
    }

    #[tokio::test]
    async fn test_error_on_400_is_not_retried() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/1/cards/c1"))
            .respond_with(ResponseTemplate::new(400).set_body_string("invalid value for idList"))
            .expect(1)
            .mount(&server)
            .await;

        let transport = HttpTransport::new(create_config(&server.uri(), fast_retry())).unwrap();

        let result: TrelloResult<TestResponse> =
            transport.put("cards/c1", &serde_json::json!({"idList": "nope"})).await;
        match result {
            Err(TrelloError::Api { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "invalid value for idList");
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_error_on_401() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/1/members/me/boards"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid token"))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(create_config(&server.uri(), RetryConfig::no_retry())).unwrap();

        let result: TrelloResult<Vec<TestResponse>> = transport.get("members/me/boards").await;
        assert!(matches!(result, Err(TrelloError::Authentication(ref m)) if m == "invalid token"));
    }

    #[tokio::test]
    async fn test_put_with_query() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/1/lists/l1/closed"))
            .and(query_param("value", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(TestResponse {
                id: "l1".to_string(),
                name: "Done".to_string(),
            }))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(create_config(&server.uri(), RetryConfig::no_retry())).unwrap();

        let result: TestResponse = transport
            .put_with_query("lists/l1/closed", &[("value", "true")])
            .await
            .unwrap();
        assert_eq!(result.name, "Done");
    }

    #[tokio::test]
    async fn test_build_url() {
        let transport =
            HttpTransport::new(create_config("http://localhost:8080", RetryConfig::no_retry())).unwrap();

        let url = transport.build_url("/boards/b1").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/1/boards/b1");

        let url = transport.build_url("boards/b1/lists").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/1/boards/b1/lists");
    }
}
