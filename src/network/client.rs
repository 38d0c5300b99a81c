//! HTTP client for making requests to search providers

use super::user_agent::{accept_for, generate_user_agent};
use super::Transport;
use crate::config::OutgoingSettings;
use crate::error::ProviderFailure;
use crate::providers::{HttpMethod, ProviderRequest, ProviderResponse};
use async_trait::async_trait;
use reqwest::{Client, Response};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// reqwest-backed [`Transport`]
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    default_timeout: Duration,
    user_agent: Option<String>,
    extra_headers: HashMap<String, String>,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> reqwest::Result<Self> {
        Self::with_settings(&OutgoingSettings::default())
    }

    /// Create a new HTTP client with custom settings
    pub fn with_settings(settings: &OutgoingSettings) -> reqwest::Result<Self> {
        let mut builder = Client::builder()
            .timeout(Duration::from_secs_f64(settings.request_timeout))
            .pool_max_idle_per_host(settings.pool_maxsize)
            .gzip(true)
            .brotli(true);

        // SSL verification
        if !settings.verify_ssl {
            builder = builder.danger_accept_invalid_certs(true);
        }

        // Proxy settings
        if let Some(ref proxy_url) = settings.proxies.all {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
        } else {
            if let Some(ref http) = settings.proxies.http {
                builder = builder.proxy(reqwest::Proxy::http(http)?);
            }
            if let Some(ref https) = settings.proxies.https {
                builder = builder.proxy(reqwest::Proxy::https(https)?);
            }
        }

        Ok(Self {
            client: builder.build()?,
            default_timeout: Duration::from_secs_f64(settings.request_timeout),
            user_agent: settings.user_agent.clone(),
            extra_headers: settings.extra_headers.clone(),
        })
    }

    /// Execute a provider request with a custom timeout
    pub async fn execute_with_timeout(
        &self,
        request: ProviderRequest,
        timeout: Duration,
    ) -> Result<ProviderResponse, ProviderFailure> {
        let mut req_builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
        };

        let user_agent = self
            .user_agent
            .clone()
            .unwrap_or_else(generate_user_agent);
        let accept = accept_for(
            request.headers.get("Accept").map(String::as_str),
            request.form.is_some(),
        );

        req_builder = req_builder
            .timeout(timeout)
            .header("User-Agent", user_agent)
            .header("Accept", accept)
            .header("Accept-Language", "en-US,en;q=0.9")
            .header("DNT", "1");

        for (key, value) in self.extra_headers.iter().chain(&request.headers) {
            if !key.eq_ignore_ascii_case("accept") {
                req_builder = req_builder.header(key, value);
            }
        }

        if !request.params.is_empty() {
            req_builder = req_builder.query(&request.params);
        }
        if let Some(form) = &request.form {
            req_builder = req_builder.form(form);
        }

        debug!("{:?} {}", request.method, request.url);
        let response = req_builder.send().await.map_err(map_error)?;

        Self::parse_response(response).await
    }

    /// Parse response into ProviderResponse
    async fn parse_response(response: Response) -> Result<ProviderResponse, ProviderFailure> {
        let status = response.status().as_u16();
        let url = response.url().to_string();

        let mut headers = HashMap::new();
        for (key, value) in response.headers() {
            if let Ok(v) = value.to_str() {
                headers.insert(key.to_string(), v.to_string());
            }
        }

        let text = response.text().await.map_err(map_error)?;

        Ok(ProviderResponse {
            status,
            headers,
            text,
            url,
        })
    }
}

fn map_error(err: reqwest::Error) -> ProviderFailure {
    if err.is_timeout() {
        ProviderFailure::Timeout
    } else {
        ProviderFailure::Transport(err.to_string())
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn execute(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderFailure> {
        self.execute_with_timeout(request, self.default_timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_client_creation() {
        let client = HttpClient::new();
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_get_sends_params_and_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "rust lang"))
            .and(header("X-Api-Key", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"ok": true}"#))
            .mount(&server)
            .await;

        let client = HttpClient::new().unwrap();
        let request = ProviderRequest::get(format!("{}/search", server.uri()))
            .param("q", "rust lang")
            .header("X-Api-Key", "secret");
        let response = client.execute(request).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.text, r#"{"ok": true}"#);
    }

    #[tokio::test]
    async fn test_post_sends_form() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/html/"))
            .and(body_string_contains("q=tokio"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;

        let client = HttpClient::new().unwrap();
        let mut form = std::collections::BTreeMap::new();
        form.insert("q".to_string(), "tokio".to_string());
        let request = ProviderRequest::post(format!("{}/html/", server.uri())).form(form);

        let response = client.execute(request).await.unwrap();
        assert!(response.is_success());
    }

    #[tokio::test]
    async fn test_error_status_is_returned_not_raised() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = HttpClient::new().unwrap();
        let response = client
            .execute(ProviderRequest::get(server.uri()))
            .await
            .unwrap();
        assert_eq!(response.status, 503);
    }

    #[tokio::test]
    async fn test_slow_response_is_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let client = HttpClient::new().unwrap();
        let err = client
            .execute_with_timeout(ProviderRequest::get(server.uri()), Duration::from_millis(50))
            .await
            .unwrap_err();
        assert_eq!(err, ProviderFailure::Timeout);
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let client = HttpClient::new().unwrap();
        let err = client
            .execute(ProviderRequest::get("http://127.0.0.1:9/"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderFailure::Transport(_)));
    }
}
