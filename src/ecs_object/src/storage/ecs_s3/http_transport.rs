//! HTTP transport backed by reqwest.
//!
//! Requests are sent unsigned with path-style addressing. Deployments that
//! need authentication either front the service with a signing proxy or hand
//! in a preconfigured `reqwest::Client` through [`HttpTransport::with_client`].

use async_trait::async_trait;
use http::header::CONTENT_LENGTH;
use http::Method;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tracing::{debug, trace};

use super::config::ObjectClientConfig;
use super::error::ObjectResult;
use super::protocol::{WireRequest, WireResponse};
use super::transport::ObjectTransport;

/// Characters escaped in object keys; `/` is kept as a path separator.
const KEY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Characters escaped in query components.
const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// reqwest implementation of [`ObjectTransport`].
#[derive(Clone, Debug)]
pub struct HttpTransport {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build a transport with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the HTTP client cannot be built.
    pub fn new(config: &ObjectClientConfig) -> ObjectResult<Self> {
        let mut builder = reqwest::Client::builder().timeout(config.request_timeout());
        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }
        Ok(Self::with_client(config.endpoint.clone(), builder.build()?))
    }

    /// Use an existing HTTP client.
    pub fn with_client(endpoint: impl Into<String>, client: reqwest::Client) -> Self {
        let endpoint = endpoint.into();
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request_url(&self, request: &WireRequest) -> String {
        let mut url = format!(
            "{}/{}",
            self.endpoint,
            utf8_percent_encode(&request.bucket, KEY_ENCODE_SET)
        );
        if let Some(key) = &request.key {
            url.push('/');
            url.extend(utf8_percent_encode(key, KEY_ENCODE_SET));
        }
        for (idx, (name, value)) in request.query.iter().enumerate() {
            url.push(if idx == 0 { '?' } else { '&' });
            url.extend(utf8_percent_encode(name, QUERY_ENCODE_SET));
            url.push('=');
            url.extend(utf8_percent_encode(value, QUERY_ENCODE_SET));
        }
        url
    }
}

#[async_trait]
impl ObjectTransport for HttpTransport {
    async fn execute(&self, request: WireRequest) -> ObjectResult<WireResponse> {
        let url = self.request_url(&request);
        trace!(method = %request.method, %url, "sending request");

        let WireRequest {
            method,
            mut headers,
            body,
            ..
        } = request;
        // reqwest derives it from the body.
        headers.remove(CONTENT_LENGTH);

        let mut builder = self.client.request(method.clone(), &url).headers(headers);
        if method == Method::PUT || !body.is_empty() {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;
        debug!(%method, %url, status = status.as_u16(), "received response");

        Ok(WireResponse {
            status,
            headers,
            body,
        })
    }
}
