// ABOUTME: Main library entry point for newsparser, a news article fetcher and extractor.
// ABOUTME: Re-exports the public API: Client, Pipeline, Registry, Retriever, News and the error types.

//! newsparser - fetches news article pages and extracts structured records.
//!
//! Pages are fetched by a [`Retriever`], routed by host through a
//! [`Registry`] of per-site extractors, and reconciled from linked data,
//! meta tags and body markup into a [`News`] record. Many URLs at once go
//! through the staged, cancellable [`Pipeline`].
//!
//! # Example
//!
//! ```no_run
//! use newsparser::{Client, ParseError};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ParseError> {
//!     let client = Client::new()?;
//!     let out = client
//!         .parse("https://www.cna.com.tw/news/ahel/202308230179.aspx")
//!         .await?;
//!     println!("{}", out.news);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod extractors;
pub mod news;
pub mod options;
pub mod pipeline;
pub mod registry;
pub mod resource;
pub mod result;
pub mod sites;
pub mod text;

pub use crate::client::Client;
pub use crate::error::{ErrorCode, ErrorSet, ParseError, PipelineError};
pub use crate::extractors::{PageLayout, SiteExtractor};
pub use crate::news::News;
pub use crate::options::{ClientBuilder, Options};
pub use crate::pipeline::{Pipeline, PipelineHandle, PipelineOutcome, Stage};
pub use crate::registry::Registry;
pub use crate::resource::{ContentDecoder, FetchStage, Query, Retriever, RetrieverBuilder};
pub use crate::result::{Extraction, NewsCreateRequest, Result};
