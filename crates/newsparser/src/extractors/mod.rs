// ABOUTME: The per-site extractor contract plus the shared linked-data, meta and DOM frameworks.
// ABOUTME: process::extract runs one extractor over a page and reconciles its drafts into a record.

//! Extraction framework.
//!
//! Every supported site implements [`SiteExtractor`]. The trait's provided
//! methods plug the site into the shared frameworks:
//! - `ldjson`: linked-data block finder and typed decoding.
//! - `meta`: selector table driven head parsing.
//! - `fields`: DOM helpers used by body extraction.
//! - `process`: the end-to-end draft, merge and body sequence.

pub mod compiled;
pub mod fields;
pub mod ldjson;
pub mod meta;
pub mod process;

use std::borrow::Cow;

use scraper::ElementRef;
use url::Url;

use crate::error::{ErrorSet, ParseError};
use crate::news::News;

use self::ldjson::{LinkedData, DEFAULT_TARGET_TYPE};
use self::meta::{Meta, MetaSelectors};

/// Selectors locating the head, the body and the linked-data scripts of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLayout {
    pub head: &'static str,
    pub body: &'static str,
    pub linked_data: &'static str,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            head: "head",
            body: "body",
            linked_data: "script[type='application/ld+json']",
        }
    }
}

/// Capability contract implemented once per supported news site.
pub trait SiteExtractor: Send + Sync {
    /// Short stable name used in logs.
    fn name(&self) -> &'static str;

    /// Hosts this extractor claims.
    fn domains(&self) -> &'static [&'static str];

    /// Site-specific stable identifier for an article URL.
    ///
    /// Must be a pure function of the URL.
    fn to_guid(&self, url: &Url) -> String;

    fn layout(&self) -> PageLayout {
        PageLayout::default()
    }

    /// Whether the site publishes linked data at all.
    fn has_linked_data(&self) -> bool {
        true
    }

    fn linked_data_type(&self) -> &'static str {
        DEFAULT_TARGET_TYPE
    }

    /// Rewrites a located linked-data block before decoding.
    fn preprocess_linked_data<'a>(&self, block: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(block)
    }

    /// Adjusts the linked-data draft after the default field assignment.
    fn after_linked_data(&self, _draft: &mut News, _data: &LinkedData) {}

    /// Parses the site's linked data into `draft`.
    fn extract_linked_data(
        &self,
        draft: &mut News,
        scripts: &[String],
        page_url: &str,
    ) -> Result<(), ParseError> {
        if !self.has_linked_data() {
            return Ok(());
        }
        ldjson::extract_into(self, draft, scripts, page_url)
    }

    fn meta_selectors(&self) -> &MetaSelectors {
        MetaSelectors::standard()
    }

    /// Parses the head's meta tags into `draft`.
    fn extract_meta(
        &self,
        draft: &mut News,
        head: ElementRef<'_>,
        page_url: &str,
    ) -> Result<(), ParseError> {
        meta::extract_into(self, draft, head, page_url)
    }

    /// Maps the meta snapshot into the meta draft.
    fn after_meta(&self, draft: &mut News, meta: &Meta, page_url: &str) -> Result<(), ParseError>;

    /// Fills content, authors and related GUIDs from the page body.
    ///
    /// Runs after the drafts are merged, so `news` already holds everything
    /// the linked data and meta tags provided.
    fn extract_body(&self, news: &mut News, body: ElementRef<'_>) -> ErrorSet;
}
