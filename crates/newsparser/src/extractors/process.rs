// ABOUTME: End-to-end extraction for one page: linked-data and meta drafts, merge, then body scraping.
// ABOUTME: Non-fatal failures are collected alongside the record instead of aborting the page.

use scraper::Html;
use tracing::debug;
use url::Url;

use crate::error::{ErrorSet, ParseError};
use crate::extractors::fields::{document_all, document_first, html_lang, text_of};
use crate::extractors::SiteExtractor;
use crate::news::News;
use crate::result::Extraction;

/// Runs `site` over `html` fetched from `page_url`.
///
/// Order of operations:
/// 1. capture `<html lang>`;
/// 2. linked-data draft (a missing block is fine, a broken one is recorded);
/// 3. meta draft from the head;
/// 4. merge, linked data first;
/// 5. body extraction on the merged record.
pub fn extract<S: SiteExtractor + ?Sized>(
    site: &S,
    html: &str,
    page_url: &Url,
) -> Result<Extraction, ParseError> {
    let doc = Html::parse_document(html);
    let layout = site.layout();
    let url_str = page_url.as_str();
    let mut issues = ErrorSet::new();

    let lang = html_lang(&doc);

    let mut from_linked_data = News::default();
    let scripts: Vec<String> = document_all(&doc, layout.linked_data)
        .into_iter()
        .map(text_of)
        .collect();
    if let Err(e) = site.extract_linked_data(&mut from_linked_data, &scripts, url_str) {
        if e.is_linked_data_not_found() {
            debug!(site = site.name(), url = url_str, "no linked data, falling back to meta");
        } else {
            issues.add("jsonld", e);
        }
        from_linked_data = News::default();
    }

    let mut from_meta = News::default();
    match document_first(&doc, layout.head) {
        Some(head) => {
            if let Err(e) = site.extract_meta(&mut from_meta, head, url_str) {
                issues.add("meta", e);
            }
        }
        None => debug!(site = site.name(), selector = layout.head, "head not found"),
    }

    let mut news = News::merge(from_linked_data, from_meta);
    if news.language.is_empty() {
        news.language = lang.unwrap_or_default();
    }
    if news.link.is_none() {
        news.link = Some(page_url.clone());
    }
    if news.guid.is_empty() {
        if let Some(link) = &news.link {
            news.guid = site.to_guid(link);
        }
    }

    match document_first(&doc, layout.body) {
        Some(body) => issues.extend(site.extract_body(&mut news, body)),
        None => issues.add(
            "body",
            ParseError::extract(
                url_str,
                "ParseBody",
                Some(anyhow::anyhow!("no element matches {}", layout.body)),
            ),
        ),
    }

    Ok(Extraction { news, issues })
}
