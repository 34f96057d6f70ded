use reqwest::{Client, StatusCode, Url};
use serde_json::{Map, Value};
use std::time::Duration;

/// Errors raised before a usable provider payload exists
#[derive(Debug, thiserror::Error)]
pub enum ExchangeRateApiError {
    #[error("Missing API key in environment variables")]
    MissingApiKey,
    #[error("Invalid rate provider url: {0}")]
    InvalidUrl(String),
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),
    #[error("{0}")]
    Transport(String),
}

/// Raw answer from the rate provider: HTTP status plus the decoded JSON body
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl ProviderResponse {
    pub fn is_ok(&self) -> bool {
        self.status == StatusCode::OK
    }

    /// `conversion_rates` when present, an object, and non-empty
    pub fn rate_table(&self) -> Option<&Map<String, Value>> {
        self.body
            .get("conversion_rates")?
            .as_object()
            .filter(|table| !table.is_empty())
    }

    /// Provider's own failure classification, e.g. "invalid-key"
    pub fn error_type(&self) -> Option<&str> {
        self.body.get("error-type").and_then(Value::as_str)
    }
}

/// Client for the exchangerate-api style `/{key}/latest/{base}` endpoint
#[derive(Clone)]
pub struct ExchangeRateApiService {
    client: Client,
    api_key: Option<String>,
    base_url: Url,
}

impl ExchangeRateApiService {
    pub fn new(
        api_key: Option<String>,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, ExchangeRateApiError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ExchangeRateApiError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ExchangeRateApiError::InvalidUrl(base_url.to_string()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExchangeRateApiError::ClientBuild(e.to_string()))?;

        Ok(Self {
            client,
            api_key: api_key.filter(|k| !k.is_empty()),
            base_url,
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Fetch every rate anchored at `base` in a single request.
    ///
    /// Fails with `MissingApiKey` before touching the network when no
    /// credential is configured. Any non-JSON body is a transport fault,
    /// whatever the status code.
    pub async fn fetch_latest(&self, base: &str) -> Result<ProviderResponse, ExchangeRateApiError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ExchangeRateApiError::MissingApiKey)?;

        let url = self.latest_url(api_key, base)?;

        tracing::debug!("Requesting latest rates for base {}", base);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ExchangeRateApiError::Transport(e.without_url().to_string()))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ExchangeRateApiError::Transport(e.without_url().to_string()))?;

        let body: Value = serde_json::from_slice(&bytes).map_err(|e| {
            ExchangeRateApiError::Transport(format!(
                "Invalid JSON from rate provider (HTTP {}): {}",
                status.as_u16(),
                e
            ))
        })?;

        tracing::debug!("Rate provider answered HTTP {} for base {}", status, base);

        Ok(ProviderResponse { status, body })
    }

    fn latest_url(&self, api_key: &str, base: &str) -> Result<Url, ExchangeRateApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ExchangeRateApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push(api_key)
            .push("latest")
            .push(base);
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service(api_key: Option<&str>, base_url: &str) -> ExchangeRateApiService {
        ExchangeRateApiService::new(
            api_key.map(String::from),
            base_url,
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_latest_url_keeps_base_path() {
        let api = service(Some("k3y"), "https://v6.exchangerate-api.com/v6");
        let url = api.latest_url("k3y", "USD").unwrap();
        assert_eq!(url.as_str(), "https://v6.exchangerate-api.com/v6/k3y/latest/USD");
    }

    #[test]
    fn test_latest_url_trailing_slash() {
        let api = service(Some("k3y"), "http://localhost:9000/v6/");
        let url = api.latest_url("k3y", "EUR").unwrap();
        assert_eq!(url.as_str(), "http://localhost:9000/v6/k3y/latest/EUR");
    }

    #[test]
    fn test_latest_url_encodes_free_form_base() {
        let api = service(Some("k3y"), "http://localhost:9000");
        let url = api.latest_url("k3y", "US D/x").unwrap();
        assert_eq!(url.as_str(), "http://localhost:9000/k3y/latest/US%20D%2Fx");
    }

    #[test]
    fn test_invalid_base_url() {
        let result = ExchangeRateApiService::new(None, "not a url", Duration::from_secs(1));
        assert!(matches!(result, Err(ExchangeRateApiError::InvalidUrl(_))));
    }

    #[test]
    fn test_rate_table_requires_non_empty_object() {
        let ok = ProviderResponse {
            status: StatusCode::OK,
            body: json!({"conversion_rates": {"PKR": 280.5}}),
        };
        assert_eq!(ok.rate_table().unwrap().len(), 1);

        for body in [
            json!({}),
            json!({"conversion_rates": {}}),
            json!({"conversion_rates": null}),
            json!({"conversion_rates": [1, 2]}),
        ] {
            let response = ProviderResponse {
                status: StatusCode::OK,
                body,
            };
            assert!(response.rate_table().is_none());
        }
    }

    #[test]
    fn test_error_type() {
        let response = ProviderResponse {
            status: StatusCode::OK,
            body: json!({"result": "error", "error-type": "unsupported-code"}),
        };
        assert_eq!(response.error_type(), Some("unsupported-code"));
    }

    #[tokio::test]
    async fn test_missing_api_key_skips_network() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let api = service(None, &mock_server.uri());
        assert!(!api.has_api_key());

        let result = api.fetch_latest("USD").await;
        assert!(matches!(result, Err(ExchangeRateApiError::MissingApiKey)));
    }

    #[tokio::test]
    async fn test_fetch_latest_returns_status_and_body() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/test-key/latest/USD"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": "success",
                "base_code": "USD",
                "conversion_rates": {"USD": 1, "PKR": 280.5}
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let api = service(Some("test-key"), &mock_server.uri());
        let response = api.fetch_latest("USD").await.unwrap();

        assert!(response.is_ok());
        assert_eq!(response.body["base_code"], "USD");
        assert_eq!(response.rate_table().unwrap()["PKR"], json!(280.5));
    }

    #[tokio::test]
    async fn test_non_json_body_is_transport_fault() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
            .mount(&mock_server)
            .await;

        let api = service(Some("test-key"), &mock_server.uri());
        let err = api.fetch_latest("USD").await.unwrap_err();

        match err {
            ExchangeRateApiError::Transport(msg) => assert!(msg.contains("HTTP 502")),
            other => panic!("expected transport error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_fault() {
        // Bind then drop a listener so nothing is accepting on the port
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let api = service(Some("secret-key"), &format!("http://{}", addr));
        let err = api.fetch_latest("USD").await.unwrap_err();

        match err {
            ExchangeRateApiError::Transport(msg) => assert!(!msg.contains("secret-key")),
            other => panic!("expected transport error, got {:?}", other),
        }
    }
}
