// ABOUTME: ETtoday (www.ettoday.net) extractor.
// ABOUTME: The first story paragraph is the byline; linked data carries hidden separators that break JSON.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::ElementRef;
use url::Url;

use crate::error::{ErrorSet, ParseError};
use crate::extractors::fields::{collect_related, has_match, select_all, select_first, text_of};
use crate::extractors::ldjson::LinkedData;
use crate::extractors::meta::{Meta, MetaField, MetaSelectors};
use crate::extractors::SiteExtractor;
use crate::news::News;
use crate::text::strip_hidden_chars;

static REPORTED_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"／.+報導$").expect("valid regex"));

static SELECTORS: Lazy<MetaSelectors> = Lazy::new(|| {
    MetaSelectors::empty()
        .with(
            MetaField::Link,
            "link[rel='canonical'][itemprop='mainEntityOfPage']",
        )
        .with(MetaField::Description, "meta[name='description']")
        .with(
            MetaField::Category,
            "meta[name='section'][property='article:section']",
        )
        .with(
            MetaField::PubDate,
            "meta[name='pubdate'][property='article:published_time'][itemprop='datePublished']",
        )
        .with(
            MetaField::Keywords,
            "meta[name='news_keywords'][itemprop='keywords']",
        )
});

pub struct EtToday;

/// Parses bylines such as `記者王小明、李大華／台北報導` or `政治中心／王小明`.
fn byline_authors(s: &str) -> Vec<String> {
    if REPORTED_RE.is_match(s) {
        return REPORTED_RE
            .replace_all(s, "")
            .split('、')
            .map(|a| a.strip_prefix("記者").unwrap_or(a).trim().to_string())
            .collect();
    }
    let parts: Vec<&str> = s.split('／').collect();
    let names = if parts.len() > 1 { &parts[1..] } else { &parts[..] };
    names.iter().map(|a| a.trim().to_string()).collect()
}

fn is_story_text(s: &str) -> bool {
    s.chars().next().is_some_and(|c| c != '▸' && c != '▲')
}

impl SiteExtractor for EtToday {
    fn name(&self) -> &'static str {
        "ettoday"
    }

    fn domains(&self) -> &'static [&'static str] {
        &["www.ettoday.net"]
    }

    /// `/news/20230904/2575420.htm` becomes `20230904-2575420`.
    fn to_guid(&self, url: &Url) -> String {
        let path = url.path();
        let path = path.strip_suffix(".htm").unwrap_or(path);
        path.split('/').skip(2).collect::<Vec<_>>().join("-")
    }

    fn preprocess_linked_data<'a>(&self, block: &'a str) -> Cow<'a, str> {
        Cow::Owned(strip_hidden_chars(block))
    }

    fn after_linked_data(&self, draft: &mut News, _data: &LinkedData) {
        draft.author.clear();
    }

    fn meta_selectors(&self) -> &MetaSelectors {
        &SELECTORS
    }

    fn after_meta(&self, draft: &mut News, meta: &Meta, page_url: &str) -> Result<(), ParseError> {
        let linked = meta.assign_common(draft, page_url, |u| self.to_guid(u));
        let parts: Vec<&str> = meta.title.split(" | ").collect();
        draft.title = if parts.len() >= 3 {
            parts[0].trim().to_string()
        } else {
            meta.title.trim().to_string()
        };
        linked
    }

    fn extract_body(&self, news: &mut News, body: ElementRef<'_>) -> ErrorSet {
        for p in select_all(body, "article div.story[itemprop='articleBody'] > p") {
            if has_match(p, "span strong") {
                continue;
            }
            let raw = text_of(p);
            if raw.starts_with("延伸閱讀") {
                continue;
            }
            let text = raw.trim();
            if !is_story_text(text) {
                continue;
            }
            if news.author.is_empty() {
                news.author = byline_authors(text);
            } else {
                news.content.push(text.to_string());
            }
        }

        let Some(list) = select_first(body, "div#hot_area div.tab_content div.piece div.part_list_3") else {
            return ErrorSet::new();
        };
        collect_related(news, list, "h3 a", |_| true, |u| self.to_guid(u))
    }
}
