// ABOUTME: The fetch stage: a configured Retriever turning raw URL queries into open, decodable responses.
// ABOUTME: Each fetch step is a standalone function so the bulk pipeline runs exactly the same logic.

pub mod decode;
pub mod query;

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_ENCODING, CONTENT_ENCODING, USER_AGENT};
use tracing::{debug, warn};
use url::Url;

use crate::error::ParseError;

pub use self::decode::ContentDecoder;
pub use self::query::Query;

/// Desktop Chrome on Linux.
pub const LINUX_CHROME_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/116.0.0.0 Safari/537.36";

/// Accept header sent by desktop browsers for page navigations.
pub const BROWSER_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// One step of fetching a query, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchStage {
    ParseUrl,
    Request,
    CheckStatus,
    SelectDecoder,
}

impl FetchStage {
    pub const ALL: [FetchStage; 4] = [
        FetchStage::ParseUrl,
        FetchStage::Request,
        FetchStage::CheckStatus,
        FetchStage::SelectDecoder,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FetchStage::ParseUrl => "parse-url",
            FetchStage::Request => "request",
            FetchStage::CheckStatus => "check-status",
            FetchStage::SelectDecoder => "select-decoder",
        }
    }
}

impl fmt::Display for FetchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Shared, read-only fetch configuration: HTTP client, headers, timeout and decoders.
#[derive(Debug, Clone)]
pub struct Retriever {
    client: reqwest::Client,
    headers: HeaderMap,
    timeout: Duration,
    decoders: HashMap<String, ContentDecoder>,
}

impl Retriever {
    pub fn builder() -> RetrieverBuilder {
        RetrieverBuilder::new()
    }

    /// A retriever with browser-like headers, gzip support and the default timeout.
    pub fn new() -> Result<Self, ParseError> {
        RetrieverBuilder::new()
            .default_headers()
            .default_timeout()
            .build()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Encoding tags with a registered decoder, sorted.
    pub fn encodings(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.decoders.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }

    /// Runs every fetch step on `query`, stopping at the first failure.
    ///
    /// On success the query holds an open response and a decoder; read it
    /// with [`Query::content`]. On failure the error is stored on the query
    /// and the response, if any, is released.
    pub async fn fetch_one(&self, mut query: Query) -> Query {
        for stage in FetchStage::ALL {
            if let Err(e) = self.step(stage, &mut query).await {
                warn!(id = query.id, url = %query.raw_url, stage = stage.name(), error = %e, "fetch failed");
                query.fail(e);
                break;
            }
        }
        query
    }

    /// Applies a single fetch step.
    pub async fn step(&self, stage: FetchStage, query: &mut Query) -> Result<(), ParseError> {
        debug!(id = query.id, stage = stage.name(), "fetch step");
        match stage {
            FetchStage::ParseUrl => parse_url(query),
            FetchStage::Request => self.send_request(query).await,
            FetchStage::CheckStatus => check_status(query),
            FetchStage::SelectDecoder => self.select_decoder(query),
        }
    }

    async fn send_request(&self, query: &mut Query) -> Result<(), ParseError> {
        let Some(url) = query.url.clone() else {
            return Err(ParseError::invalid_url(
                &query.raw_url,
                "Request",
                Some(anyhow::anyhow!("url not parsed")),
            ));
        };

        let response = self
            .client
            .get(url)
            .headers(self.headers.clone())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ParseError::timeout(&query.raw_url, "Request", Some(e.into()))
                } else {
                    ParseError::transport(&query.raw_url, "Request", Some(e.into()))
                }
            })?;

        query.status = Some(response.status().as_u16());
        query.response = Some(response);
        Ok(())
    }

    fn select_decoder(&self, query: &mut Query) -> Result<(), ParseError> {
        let Some(response) = query.response.as_ref() else {
            return Err(ParseError::no_handler(&query.raw_url, "SelectDecoder"));
        };

        let encoding = response
            .headers()
            .get(CONTENT_ENCODING)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim().to_ascii_lowercase())
            .unwrap_or_default();

        let decoder = self
            .decoders
            .get(&encoding)
            .cloned()
            .unwrap_or_else(ContentDecoder::identity);
        debug!(id = query.id, encoding = %encoding, decoder = decoder.name(), "decoder selected");
        query.decoder = Some(decoder);
        Ok(())
    }
}

fn parse_url(query: &mut Query) -> Result<(), ParseError> {
    let raw = query.raw_url.trim();
    if raw.is_empty() {
        return Err(ParseError::invalid_url(raw, "ParseUrl", Some(anyhow::anyhow!("empty URL"))));
    }

    let url = Url::parse(raw).map_err(|e| {
        ParseError::invalid_url(raw, "ParseUrl", Some(anyhow::anyhow!("invalid URL: {}", e)))
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ParseError::invalid_url(
            raw,
            "ParseUrl",
            Some(anyhow::anyhow!("scheme must be http or https")),
        ));
    }

    query.url = Some(url);
    Ok(())
}

fn check_status(query: &mut Query) -> Result<(), ParseError> {
    match query.status {
        Some(200) => Ok(()),
        Some(code) => Err(ParseError::status(&query.raw_url, "CheckStatus", code)),
        None => Err(ParseError::transport(
            &query.raw_url,
            "CheckStatus",
            Some(anyhow::anyhow!("no response")),
        )),
    }
}

/// Composable options for a [`Retriever`], applied in call order.
///
/// Like `reqwest::ClientBuilder`, an invalid option does not fail
/// immediately; the first one is kept and returned by [`build`](Self::build).
#[derive(Debug, Default)]
pub struct RetrieverBuilder {
    headers: HeaderMap,
    decoders: HashMap<String, ContentDecoder>,
    client: Option<reqwest::Client>,
    timeout: Option<Duration>,
    error: Option<ParseError>,
}

impl RetrieverBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&mut self, err: ParseError) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }

    /// Sets a request header, replacing any earlier value for the same name.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        let name = match HeaderName::from_bytes(name.as_bytes()) {
            Ok(n) => n,
            Err(e) => {
                self.record(ParseError::config("Header", Some(anyhow::anyhow!("invalid header name {:?}: {}", name, e))));
                return self;
            }
        };
        match HeaderValue::from_str(value) {
            Ok(v) => {
                self.headers.insert(name, v);
            }
            Err(e) => self.record(ParseError::config(
                "Header",
                Some(anyhow::anyhow!("invalid value for header {}: {}", name, e)),
            )),
        }
        self
    }

    pub fn user_agent(self, ua: &str) -> Self {
        self.header(USER_AGENT.as_str(), ua)
    }

    pub fn user_agent_linux_chrome(self) -> Self {
        self.user_agent(LINUX_CHROME_USER_AGENT)
    }

    pub fn accept(self, accept: &str) -> Self {
        self.header(ACCEPT.as_str(), accept)
    }

    pub fn accept_encoding(self, encoding: &str) -> Self {
        self.header(ACCEPT_ENCODING.as_str(), encoding)
    }

    /// Registers `decoder` under its own name.
    pub fn content_encoding_handler(self, decoder: ContentDecoder) -> Self {
        let tag = decoder.name().to_string();
        self.compression(&tag, decoder)
    }

    /// Registers `decoder` for responses whose `Content-Encoding` is `tag`.
    pub fn compression(mut self, tag: &str, decoder: ContentDecoder) -> Self {
        self.decoders.insert(tag.trim().to_ascii_lowercase(), decoder);
        self
    }

    /// Advertises gzip and decodes gzip responses.
    pub fn gzip_compression(self) -> Self {
        self.accept_encoding("gzip")
            .compression("gzip", ContentDecoder::gzip())
    }

    /// Uses a caller-provided client. It should not decompress bodies itself.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        if timeout.is_zero() {
            self.record(ParseError::config("Timeout", Some(anyhow::anyhow!("timeout must be positive"))));
            return self;
        }
        self.timeout = Some(timeout);
        self
    }

    pub fn default_timeout(self) -> Self {
        self.timeout(DEFAULT_TIMEOUT)
    }

    /// Linux Chrome user agent, browser Accept header and gzip.
    pub fn default_headers(self) -> Self {
        self.user_agent_linux_chrome()
            .accept(BROWSER_ACCEPT)
            .gzip_compression()
    }

    /// User agent and Accept only; responses arrive uncompressed.
    pub fn test_headers(self) -> Self {
        self.user_agent_linux_chrome().accept(BROWSER_ACCEPT)
    }

    pub fn build(self) -> Result<Retriever, ParseError> {
        if let Some(err) = self.error {
            return Err(err);
        }

        let client = match self.client {
            Some(c) => c,
            // Decompression is left to the registered decoders.
            None => reqwest::Client::builder()
                .cookie_store(true)
                .no_gzip()
                .no_brotli()
                .no_deflate()
                .build()
                .map_err(|e| ParseError::config("Client", Some(e.into())))?,
        };

        Ok(Retriever {
            client,
            headers: self.headers,
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
            decoders: self.decoders,
        })
    }
}
