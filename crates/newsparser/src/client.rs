// ABOUTME: The Client façade tying the retriever, the domain registry and the bulk pipeline together.
// ABOUTME: parse() handles one URL, parse_html() extracts offline, parse_many() streams through the pipeline.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};
use url::Url;

use crate::error::ParseError;
use crate::options::ClientBuilder;
use crate::pipeline::{Pipeline, PipelineOutcome};
use crate::registry::Registry;
use crate::resource::{Query, Retriever};
use crate::result::Extraction;

/// Fetches and extracts news articles from supported sites.
///
/// Cheap to clone; the retriever and registry are shared.
#[derive(Debug, Clone)]
pub struct Client {
    retriever: Arc<Retriever>,
    registry: Arc<Registry>,
    capacity: usize,
}

fn parse_page_url(url: &str, op: &str) -> Result<Url, ParseError> {
    Url::parse(url.trim()).map_err(|e| {
        ParseError::invalid_url(url, op, Some(anyhow::anyhow!("malformed URL: {}", e)))
    })
}

impl Client {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// A client with browser-like defaults and every built-in site.
    pub fn new() -> Result<Self, ParseError> {
        ClientBuilder::new().build()
    }

    pub(crate) fn from_parts(retriever: Arc<Retriever>, registry: Arc<Registry>, capacity: usize) -> Self {
        Self {
            retriever,
            registry,
            capacity,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// Fetches `url` and extracts its record.
    ///
    /// Unsupported hosts are rejected before any request is made.
    #[instrument(level = "debug", skip(self))]
    pub async fn parse(&self, url: &str) -> Result<Extraction, ParseError> {
        let page = parse_page_url(url, "Parse")?;
        let host = page.host_str().unwrap_or_default();
        if !self.registry.supports_domain(host) {
            return Err(ParseError::parser_not_found(url, host));
        }

        let mut query = self.retriever.fetch_one(Query::new(url)).await;
        if let Some(err) = query.take_error() {
            return Err(err);
        }
        self.registry.extract_query(&mut query).await?;

        let issues = std::mem::take(&mut query.issues);
        match query.into_news() {
            Some(news) => Ok(Extraction { news, issues }),
            None => Err(ParseError::extract(url, "Parse", Some(anyhow::anyhow!("no record produced")))),
        }
    }

    /// Extracts a record from `html` as if it had been fetched from `url`.
    pub fn parse_html(&self, html: &str, url: &str) -> Result<Extraction, ParseError> {
        let page = parse_page_url(url, "ParseHtml")?;
        self.registry.dispatch(&page, html)
    }

    /// Runs `urls` through the staged pipeline until done or `cancel` fires.
    ///
    /// Query ids follow input order starting at 1.
    pub async fn parse_many<I>(&self, urls: I, cancel: CancellationToken) -> PipelineOutcome
    where
        I: IntoIterator<Item = String> + Send + 'static,
        I::IntoIter: Send,
    {
        let outcome = Pipeline::new(Arc::clone(&self.retriever))
            .with_registry(Arc::clone(&self.registry))
            .capacity(self.capacity)
            .cancel_token(cancel)
            .run_urls(urls)
            .collect()
            .await;
        info!(
            records = outcome.queries.len(),
            failures = outcome.errors.len(),
            "pipeline finished"
        );
        outcome
    }

    /// Site GUID for `url`, falling back to the URL path for unknown hosts.
    pub fn derive_guid(&self, url: &str) -> Result<String, ParseError> {
        let page = parse_page_url(url, "DeriveGuid")?;
        Ok(self.registry.derive_guid(&page))
    }
}
