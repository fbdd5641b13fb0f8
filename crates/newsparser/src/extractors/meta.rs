// ABOUTME: Meta-tag framework: selector builder, per-field selector tables and head snapshot collection.
// ABOUTME: Duplicate matches are de-duplicated and comma-joined; dates degrade to None when unparsable.

//! Meta-tag extraction.
//!
//! A [`MetaSelectors`] table maps each logical field to a selector. The
//! selectors are evaluated against the document head and every matching
//! element contributes its `content` (or `href` for the link) to a
//! de-duplicated, comma-joined value in the [`Meta`] snapshot. A site hook
//! then maps the all-string snapshot into a typed draft.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use scraper::ElementRef;
use url::Url;

use crate::error::ParseError;
use crate::extractors::fields::{attr_of, select_all, select_first, text_of};
use crate::extractors::ldjson::parse_rfc3339;
use crate::extractors::SiteExtractor;
use crate::news::News;
use crate::text::parse_csl;

#[derive(Debug, Clone, Default)]
struct SelectorElement {
    tag: String,
    id: String,
    classes: Vec<String>,
    attrs: Vec<(String, String)>,
}

impl SelectorElement {
    fn render(&self) -> String {
        let mut s = self.tag.clone();
        if !self.id.is_empty() {
            s.push('#');
            s.push_str(&self.id);
        }
        for class in &self.classes {
            s.push('.');
            s.push_str(class);
        }
        for (k, v) in &self.attrs {
            s.push_str(&format!("[{}='{}']", k, v));
        }
        s
    }
}

/// Minimal builder for descendant-combinator CSS selectors.
///
/// ```
/// use newsparser::extractors::meta::SelectorBuilder;
///
/// let css = SelectorBuilder::new()
///     .append("meta", &[], &[("name", "description"), ("itemprop", "description")])
///     .build();
/// assert_eq!(css, "meta[name='description'][itemprop='description']");
/// ```
#[derive(Debug, Clone, Default)]
pub struct SelectorBuilder {
    elements: Vec<SelectorElement>,
}

impl SelectorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one compound selector (tag, classes, attribute equalities).
    pub fn append(mut self, tag: &str, classes: &[&str], attrs: &[(&str, &str)]) -> Self {
        self.elements.push(SelectorElement {
            tag: tag.to_string(),
            classes: classes.iter().map(|c| c.to_string()).collect(),
            attrs: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            ..Default::default()
        });
        self
    }

    /// Sets the id of the most recently appended element.
    pub fn id(mut self, id: &str) -> Self {
        if let Some(last) = self.elements.last_mut() {
            last.id = id.to_string();
        }
        self
    }

    /// Joins the appended elements with the descendant combinator.
    pub fn build(&self) -> String {
        self.elements
            .iter()
            .map(SelectorElement::render)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Logical meta fields collected from the document head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MetaField {
    Link,
    Description,
    Language,
    Author,
    Category,
    PubDate,
    ModDate,
    Keywords,
}

impl MetaField {
    pub const ALL: [MetaField; 8] = [
        MetaField::Link,
        MetaField::Description,
        MetaField::Language,
        MetaField::Author,
        MetaField::Category,
        MetaField::PubDate,
        MetaField::ModDate,
        MetaField::Keywords,
    ];

    /// Attribute holding the value for this field.
    pub fn attr(self) -> &'static str {
        match self {
            MetaField::Link => "href",
            _ => "content",
        }
    }
}

/// Field-to-selector table; fields without a selector are left empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetaSelectors {
    map: BTreeMap<MetaField, String>,
}

static DEFAULT_SELECTORS: Lazy<MetaSelectors> = Lazy::new(|| {
    let meta = |attrs: &[(&str, &str)]| SelectorBuilder::new().append("meta", &[], attrs).build();
    MetaSelectors::empty()
        .with(
            MetaField::Link,
            SelectorBuilder::new()
                .append("link", &[], &[("rel", "canonical")])
                .build(),
        )
        .with(
            MetaField::Description,
            meta(&[("name", "description"), ("itemprop", "description")]),
        )
        .with(
            MetaField::Language,
            meta(&[("http-equiv", "content-language")]),
        )
        .with(
            MetaField::Author,
            meta(&[("name", "author"), ("itemprop", "author")]),
        )
        .with(
            MetaField::Category,
            meta(&[
                ("name", "section"),
                ("property", "article:section"),
                ("itemprop", "articleSection"),
            ]),
        )
        .with(
            MetaField::PubDate,
            meta(&[
                ("name", "pubdate"),
                ("property", "article:published_time"),
                ("itemprop", "datePublished"),
            ]),
        )
        .with(
            MetaField::ModDate,
            meta(&[
                ("name", "lastmod"),
                ("property", "article:modified_time"),
                ("itemprop", "dateModified"),
            ]),
        )
        .with(MetaField::Keywords, meta(&[("itemprop", "keywords")]))
});

impl MetaSelectors {
    /// A table with no selectors at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The shared default table.
    pub fn standard() -> &'static MetaSelectors {
        &DEFAULT_SELECTORS
    }

    /// Sets or replaces the selector for `field`.
    pub fn with(mut self, field: MetaField, selector: impl Into<String>) -> Self {
        self.map.insert(field, selector.into());
        self
    }

    /// Removes the selector for `field`.
    pub fn without(mut self, field: MetaField) -> Self {
        self.map.remove(&field);
        self
    }

    pub fn get(&self, field: MetaField) -> Option<&str> {
        self.map.get(&field).map(String::as_str)
    }
}

/// All-string snapshot of the head's meta information.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Meta {
    pub title: String,
    pub link: String,
    pub description: String,
    pub language: String,
    pub author: String,
    pub category: String,
    pub pub_date: String,
    pub mod_date: String,
    pub tag: String,
}

impl Meta {
    /// Collects a snapshot from `head` using `selectors`.
    pub fn collect(selectors: &MetaSelectors, head: ElementRef<'_>) -> Meta {
        let mut meta = Meta {
            title: select_first(head, "title").map(text_of).unwrap_or_default(),
            ..Default::default()
        };

        for field in MetaField::ALL {
            let Some(css) = selectors.get(field).filter(|s| !s.is_empty()) else {
                continue;
            };
            let mut values: Vec<&str> = Vec::new();
            for el in select_all(head, css) {
                if let Some(v) = attr_of(el, field.attr()) {
                    if !values.contains(&v) {
                        values.push(v);
                    }
                }
            }
            *meta.slot(field) = values.join(",");
        }
        meta
    }

    fn slot(&mut self, field: MetaField) -> &mut String {
        match field {
            MetaField::Link => &mut self.link,
            MetaField::Description => &mut self.description,
            MetaField::Language => &mut self.language,
            MetaField::Author => &mut self.author,
            MetaField::Category => &mut self.category,
            MetaField::PubDate => &mut self.pub_date,
            MetaField::ModDate => &mut self.mod_date,
            MetaField::Keywords => &mut self.tag,
        }
    }

    /// Parses the canonical link, resolving a relative one against `page_url`.
    /// An empty link is `Ok(None)`.
    pub fn link_url(&self, page_url: &str) -> Result<Option<Url>, ParseError> {
        let raw = self.link.split(',').next().unwrap_or("").trim();
        if raw.is_empty() {
            return Ok(None);
        }
        Url::parse(page_url)
            .and_then(|base| base.join(raw))
            .or_else(|_| Url::parse(raw))
            .map(Some)
            .map_err(|e| {
                ParseError::extract(
                    page_url,
                    "ParseMeta",
                    Some(anyhow::anyhow!("error while parsing link {}: {}", raw, e)),
                )
            })
    }

    /// Publish date as RFC3339; `None` when missing or malformed.
    pub fn published(&self) -> Option<DateTime<Utc>> {
        parse_rfc3339(&self.pub_date)
    }

    /// Publish date for sites that omit the offset from a local time.
    pub fn published_with_offset(&self, offset: &str) -> Option<DateTime<Utc>> {
        if self.pub_date.trim().is_empty() {
            return None;
        }
        parse_rfc3339(&format!("{}{}", self.pub_date.trim(), offset))
            .or_else(|| self.published())
    }

    /// Keywords as a list.
    pub fn tags(&self) -> Vec<String> {
        parse_csl(&self.tag)
    }

    /// Assigns description, category, language, tags, link, GUID and publish date.
    ///
    /// Title handling is site specific and left to the caller.
    pub fn assign_common<G>(&self, draft: &mut News, page_url: &str, to_guid: G) -> Result<(), ParseError>
    where
        G: Fn(&Url) -> String,
    {
        draft.description = self.description.trim().to_string();
        draft.category = self.category.trim().to_string();
        draft.language = self.language.trim().to_string();
        draft.tag = self.tags();
        draft.pub_date = self.published();
        draft.link = self.link_url(page_url)?;
        if let Some(link) = &draft.link {
            draft.guid = to_guid(link);
        }
        Ok(())
    }
}

/// Runs the meta framework for `site` over `head`.
pub fn extract_into<S: SiteExtractor + ?Sized>(
    site: &S,
    draft: &mut News,
    head: ElementRef<'_>,
    page_url: &str,
) -> Result<(), ParseError> {
    let meta = Meta::collect(site.meta_selectors(), head);
    site.after_meta(draft, &meta, page_url)
}
