// ABOUTME: Configuration for newsparser: file-loadable Options and the ClientBuilder.
// ABOUTME: Options translate into a RetrieverBuilder; ClientBuilder adds the registry and pipeline capacity.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::client::Client;
use crate::error::ParseError;
use crate::pipeline::DEFAULT_CAPACITY;
use crate::registry::Registry;
use crate::resource::{RetrieverBuilder, BROWSER_ACCEPT, DEFAULT_TIMEOUT, LINUX_CHROME_USER_AGENT};

/// Serializable client configuration.
///
/// Every field has a default, so a config file only needs the keys it
/// changes:
///
/// ```
/// let opts: newsparser::Options = serde_json::from_str(r#"{"timeout_secs": 3}"#).unwrap();
/// assert_eq!(opts.timeout_secs, 3);
/// assert!(opts.gzip);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    pub user_agent: String,
    pub accept: String,
    /// Extra request headers, applied after the user agent and Accept header.
    pub headers: BTreeMap<String, String>,
    pub timeout_secs: u64,
    /// Advertise and decode gzip bodies.
    pub gzip: bool,
    pub pipeline_capacity: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            user_agent: LINUX_CHROME_USER_AGENT.to_string(),
            accept: BROWSER_ACCEPT.to_string(),
            headers: BTreeMap::new(),
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            gzip: true,
            pipeline_capacity: DEFAULT_CAPACITY,
        }
    }
}

impl Options {
    /// Reads options from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ParseError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| {
            ParseError::config(
                "LoadOptions",
                Some(anyhow::anyhow!("error reading {}: {}", path.display(), e)),
            )
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            ParseError::config(
                "LoadOptions",
                Some(anyhow::anyhow!("invalid options in {}: {}", path.display(), e)),
            )
        })
    }

    /// The retriever configuration these options describe.
    ///
    /// Invalid values surface from [`RetrieverBuilder::build`].
    pub fn retriever_builder(&self) -> RetrieverBuilder {
        let mut builder = RetrieverBuilder::new()
            .user_agent(&self.user_agent)
            .accept(&self.accept);
        for (name, value) in &self.headers {
            builder = builder.header(name, value);
        }
        if self.gzip {
            builder = builder.gzip_compression();
        }
        builder.timeout(Duration::from_secs(self.timeout_secs))
    }
}

/// Builder for [`Client`].
#[derive(Debug)]
pub struct ClientBuilder {
    retriever: RetrieverBuilder,
    registry: Option<Registry>,
    capacity: usize,
}

impl ClientBuilder {
    /// Browser-like defaults with the built-in site catalogue.
    pub fn new() -> Self {
        Self {
            retriever: RetrieverBuilder::new().default_headers().default_timeout(),
            registry: None,
            capacity: DEFAULT_CAPACITY,
        }
    }

    pub fn from_options(opts: &Options) -> Self {
        Self {
            retriever: opts.retriever_builder(),
            registry: None,
            capacity: opts.pipeline_capacity,
        }
    }

    /// Replaces the whole retriever configuration.
    pub fn retriever(mut self, builder: RetrieverBuilder) -> Self {
        self.retriever = builder;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.retriever = self.retriever.timeout(timeout);
        self
    }

    pub fn user_agent(mut self, ua: &str) -> Self {
        self.retriever = self.retriever.user_agent(ua);
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.retriever = self.retriever.header(name, value);
        self
    }

    /// Uses `registry` instead of the built-in catalogue.
    pub fn registry(mut self, registry: Registry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Channel bound for [`Client::parse_many`].
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn build(self) -> Result<Client, ParseError> {
        let retriever = self.retriever.build()?;
        let registry = self.registry.unwrap_or_else(Registry::with_builtin_sites);
        Ok(Client::from_parts(
            Arc::new(retriever),
            Arc::new(registry),
            self.capacity.max(1),
        ))
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
