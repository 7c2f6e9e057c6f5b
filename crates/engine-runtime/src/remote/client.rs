use engine_config::settings::PushSettings;
use reqwest::{Client, RequestBuilder, header::CONTENT_TYPE};
use std::time::Duration;

const MAX_BODY_EXCERPT: usize = 256;

/// HTTP client for the collector. Every request carries the JSON content
/// type and the API key, as a header and optionally as a query parameter.
#[derive(Debug, Clone)]
pub struct CollectorClient {
    http: Client,
    api_key: String,
    api_key_header: String,
    api_key_query_param: Option<String>,
}

impl CollectorClient {
    pub fn new(
        timeout: Duration,
        api_key: impl Into<String>,
        api_key_header: impl Into<String>,
        api_key_query_param: Option<String>,
    ) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(CollectorClient {
            http,
            api_key: api_key.into(),
            api_key_header: api_key_header.into(),
            api_key_query_param,
        })
    }

    pub fn from_settings(settings: &PushSettings) -> Result<Self, reqwest::Error> {
        Self::new(
            settings.request_timeout,
            settings.api_key.clone(),
            settings.api_key_header.clone(),
            settings.api_key_query_param.clone(),
        )
    }

    pub fn get(&self, url: &str) -> RequestBuilder {
        self.authorize(self.http.get(url))
    }

    pub fn post(&self, url: &str) -> RequestBuilder {
        self.authorize(self.http.post(url))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request
            .header(CONTENT_TYPE, "application/json")
            .header(self.api_key_header.as_str(), self.api_key.as_str());

        match &self.api_key_query_param {
            Some(param) => request.query(&[(param.as_str(), self.api_key.as_str())]),
            None => request,
        }
    }
}

/// Leading part of a response body, for error messages.
pub(crate) fn body_excerpt(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    match text.char_indices().nth(MAX_BODY_EXCERPT) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.into_owned(),
    }
}
