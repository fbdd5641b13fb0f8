// ABOUTME: Query is the unit of work moved through the fetch stages and the pipeline.
// ABOUTME: It owns the in-flight response body until content() consumes it exactly once.

use std::fmt;

use tracing::debug;
use url::Url;

use crate::error::{ErrorSet, ParseError};
use crate::news::News;
use crate::resource::decode::{decode_body, ContentDecoder};

/// A single URL to fetch and extract, mutated in place by each stage.
///
/// A query is terminal once `error` is set or a record is attached.
pub struct Query {
    pub(crate) id: u64,
    pub(crate) raw_url: String,
    pub(crate) url: Option<Url>,
    pub(crate) status: Option<u16>,
    pub(crate) response: Option<reqwest::Response>,
    pub(crate) decoder: Option<ContentDecoder>,
    pub(crate) news: Option<News>,
    pub(crate) error: Option<ParseError>,
    /// Non-fatal issues reported by extraction.
    pub issues: ErrorSet,
}

impl Query {
    pub fn new(raw_url: impl Into<String>) -> Self {
        Self::with_id(0, raw_url)
    }

    /// A query carrying a caller-supplied correlation id.
    pub fn with_id(id: u64, raw_url: impl Into<String>) -> Self {
        Self {
            id,
            raw_url: raw_url.into(),
            url: None,
            status: None,
            response: None,
            decoder: None,
            news: None,
            error: None,
            issues: ErrorSet::new(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn raw_url(&self) -> &str {
        &self.raw_url
    }

    /// The parsed URL, once the parse step has run.
    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    /// HTTP status of the response, once received.
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn decoder(&self) -> Option<&ContentDecoder> {
        self.decoder.as_ref()
    }

    pub fn news(&self) -> Option<&News> {
        self.news.as_ref()
    }

    pub fn error(&self) -> Option<&ParseError> {
        self.error.as_ref()
    }

    pub fn is_terminal(&self) -> bool {
        self.error.is_some() || self.news.is_some()
    }

    pub fn into_news(self) -> Option<News> {
        self.news
    }

    /// Takes the terminal error, leaving the query error-free.
    pub fn take_error(&mut self) -> Option<ParseError> {
        self.error.take()
    }

    pub(crate) fn fail(&mut self, err: ParseError) {
        // Dropping the response releases the connection on every error path.
        self.response = None;
        self.error = Some(err);
    }

    /// Reads the response body, applies the selected decoder, then charset-decodes it.
    ///
    /// The body can be read once. Reading before a decoder was selected fails
    /// with a "no handler" error.
    pub async fn content(&mut self) -> Result<String, ParseError> {
        let Some(decoder) = self.decoder.clone() else {
            return Err(ParseError::no_handler(&self.raw_url, "Content"));
        };
        let Some(response) = self.response.take() else {
            return Err(ParseError::decode(
                &self.raw_url,
                "Content",
                Some(anyhow::anyhow!("response body already consumed")),
            ));
        };

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let raw = response.bytes().await.map_err(|e| {
            ParseError::transport(
                &self.raw_url,
                "Content",
                Some(anyhow::anyhow!("failed to read body: {}", e)),
            )
        })?;

        let bytes = decoder.decode(&raw).map_err(|e| {
            ParseError::decode(
                &self.raw_url,
                "Content",
                Some(anyhow::anyhow!("{} decoding failed: {}", decoder.name(), e)),
            )
        })?;
        debug!(
            id = self.id,
            url = %self.raw_url,
            decoder = decoder.name(),
            raw = raw.len(),
            decoded = bytes.len(),
            "body read"
        );

        Ok(decode_body(&bytes, content_type.as_deref()))
    }
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("id", &self.id)
            .field("raw_url", &self.raw_url)
            .field("status", &self.status)
            .field("decoder", &self.decoder.as_ref().map(ContentDecoder::name))
            .field("has_response", &self.response.is_some())
            .field("news", &self.news.as_ref().map(|n| n.guid.as_str()))
            .field("error", &self.error)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn content_before_decoder_is_no_handler() {
        let mut q = Query::with_id(7, "https://www.cna.com.tw/news/ahel/202308230179.aspx");
        let err = q.content().await.expect_err("no decoder selected");
        assert!(err.is_no_handler());
    }

    #[test]
    fn fail_makes_query_terminal() {
        let mut q = Query::new("::");
        assert!(!q.is_terminal());
        q.fail(ParseError::invalid_url("::", "ParseUrl", None));
        assert!(q.is_terminal());
        assert!(q.error().unwrap().is_invalid_url());
        assert!(q.take_error().is_some());
        assert!(q.error().is_none());
    }
}
