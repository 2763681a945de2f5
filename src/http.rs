//! HTTP transport: reqwest client construction and the default byte source.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, RequestBuilder};
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::client::{ByteSource, ByteStream, StreamError};
use crate::model::StreamRequest;
use crate::options::{HttpTransport, TransportOptions};

/// Build a configured HTTP client from transport options.
///
/// This applies common configuration like timeouts and proxies.
pub fn build_http_client(
    transport_options: &TransportOptions<HttpTransport>,
) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder();

    if let Some(timeout) = transport_options.timeout {
        builder = builder.timeout(timeout);
    }

    if let Some(proxy_url) = &transport_options.provider.proxy {
        match reqwest::Proxy::all(proxy_url) {
            Ok(proxy) => builder = builder.proxy(proxy),
            Err(e) => warn!("Ignoring invalid proxy '{}': {}", proxy_url, e),
        }
    }

    builder.build()
}

/// Add extra headers to a request if specified in transport options.
pub fn add_extra_headers(
    mut request: RequestBuilder,
    extra_headers: &Option<HashMap<String, String>>,
) -> RequestBuilder {
    if let Some(headers) = extra_headers {
        for (key, value) in headers {
            request = request.header(key, value);
        }
    }
    request
}

/// Byte source that issues the request with reqwest and streams the body.
///
/// The payload is sent as query parameters for `get`/`delete` and as a JSON
/// body otherwise. Non-2xx responses fail the session with the response body.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    transport_options: TransportOptions<HttpTransport>,
}

impl HttpSource {
    pub fn new(transport_options: TransportOptions<HttpTransport>) -> Result<Self, StreamError> {
        let client = build_http_client(&transport_options)?;
        Ok(Self {
            client,
            transport_options,
        })
    }

    fn build_request(&self, request: &StreamRequest) -> RequestBuilder {
        let transport = &self.transport_options.provider;
        let url = transport.resolve_url(&request.url);

        let mut req = self.client.request(request.method.into(), url);
        if let Some(token) = &transport.bearer_token {
            req = req.bearer_auth(token.expose_secret());
        }
        req = add_extra_headers(req, &transport.extra_headers);

        match &request.payload {
            Some(payload) if request.method.payload_in_query() => req.query(payload),
            Some(payload) => req.json(payload),
            None => req,
        }
    }
}

#[async_trait]
impl ByteSource for HttpSource {
    async fn open(&self, request: &StreamRequest) -> Result<ByteStream, StreamError> {
        let response = self.build_request(request).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StreamError::Status { status, body });
        }

        debug!(
            "Stream opened: {} {} -> {} ({})",
            request.method,
            request.url,
            status,
            response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("no content type")
        );

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(StreamError::from))
            .boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{Method, SecretString};
    use serde_json::json;
    use std::time::Duration;

    fn transport() -> TransportOptions<HttpTransport> {
        TransportOptions {
            timeout: Some(Duration::from_secs(30)),
            provider: HttpTransport {
                bearer_token: Some(SecretString::new("test".to_string())),
                base_url: Some("http://localhost:9000".to_string()),
                proxy: None,
                extra_headers: None,
            },
        }
    }

    #[test]
    fn test_build_http_client() {
        assert!(build_http_client(&transport()).is_ok());
    }

    #[test]
    fn test_build_http_client_with_proxy() {
        let mut options = transport();
        options.provider.proxy = Some("http://proxy.example.com:8080".to_string());
        assert!(build_http_client(&options).is_ok());
    }

    #[test]
    fn test_get_payload_goes_to_query() {
        let source = HttpSource::new(transport()).unwrap();
        let request = StreamRequest::new(
            "/events",
            Method::Get,
            Some(json!({"topic": "chat", "limit": 50})),
        );
        let built = source.build_request(&request).build().unwrap();

        assert_eq!(built.method(), &reqwest::Method::GET);
        assert_eq!(built.url().path(), "/events");
        assert_eq!(built.url().query(), Some("limit=50&topic=chat"));
        assert!(built.body().is_none());
        assert_eq!(
            built.headers().get("authorization").unwrap(),
            "Bearer test"
        );
    }

    #[test]
    fn test_post_payload_goes_to_body() {
        let source = HttpSource::new(transport()).unwrap();
        let request = StreamRequest::new("/chat", Method::Post, Some(json!({"room": 123})));
        let built = source.build_request(&request).build().unwrap();

        assert_eq!(built.method(), &reqwest::Method::POST);
        assert_eq!(built.url().query(), None);
        let body = built.body().and_then(|b| b.as_bytes()).unwrap();
        assert_eq!(serde_json::from_slice::<serde_json::Value>(body).unwrap(), json!({"room": 123}));
    }

    #[test]
    fn test_extra_headers_are_applied() {
        let mut options = transport();
        options.provider = options
            .provider
            .with_header("X-Trace".to_string(), "abc".to_string());
        let source = HttpSource::new(options).unwrap();
        let built = source
            .build_request(&StreamRequest::new("/x", Method::Delete, None))
            .build()
            .unwrap();
        assert_eq!(built.headers().get("x-trace").unwrap(), "abc");
    }
}
