// ABOUTME: Liberty Times (news.ltn.com.tw, sports.ltn.com.tw) extractor.
// ABOUTME: News and sports pages share meta tags but lay out their article text differently.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::ElementRef;
use url::Url;

use crate::error::{ErrorSet, ParseError};
use crate::extractors::fields::{attr_of, collect_related, select_all, text_of};
use crate::extractors::meta::{Meta, MetaField, MetaSelectors};
use crate::extractors::{PageLayout, SiteExtractor};
use crate::news::News;
use crate::text::clean_paragraph;

const SPORTS_HOST: &str = "sports.ltn.com.tw";

/// Opening byline such as `〔記者王小明／台北報導〕`.
static BYLINE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^〔(.+)／.{1,10}〕").expect("valid regex"));

static SELECTORS: Lazy<MetaSelectors> = Lazy::new(|| {
    MetaSelectors::empty()
        .with(MetaField::Link, "link[rel='canonical']")
        .with(
            MetaField::Description,
            "meta[name='description'][itemprop='description']",
        )
        .with(
            MetaField::Category,
            "meta[name='section'][property='article:section'][itemprop='articleSection']",
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

pub struct Ltn;

impl Ltn {
    fn news_paragraphs(body: ElementRef<'_>) -> Vec<String> {
        select_all(
            body,
            "div.content div.whitecon[itemprop='articleBody'] div.text > p",
        )
        .into_iter()
        .filter(|p| attr_of(*p, "class").is_none())
        .map(|p| clean_paragraph(&text_of(p)))
        .filter(|s| !s.is_empty())
        .collect()
    }

    fn sports_paragraphs(body: ElementRef<'_>) -> Vec<String> {
        select_all(body, "div.content div.whitecon[data-desc='內文'] div.text > p")
            .into_iter()
            .filter(|p| attr_of(*p, "class").is_none() && p.children().all(|c| !c.value().is_element()))
            .map(|p| clean_paragraph(&text_of(p)))
            .filter(|s| !s.is_empty())
            .collect()
    }

    fn byline_authors(first: &str) -> Vec<String> {
        let Some(names) = BYLINE_RE.captures(first).and_then(|c| c.get(1)) else {
            return Vec::new();
        };
        names
            .as_str()
            .trim_start_matches(['記', '者'])
            .split('、')
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .collect()
    }
}

impl SiteExtractor for Ltn {
    fn name(&self) -> &'static str {
        "ltn"
    }

    fn domains(&self) -> &'static [&'static str] {
        &["news.ltn.com.tw", SPORTS_HOST]
    }

    fn to_guid(&self, url: &Url) -> String {
        super::dashed_path(url)
    }

    fn layout(&self) -> PageLayout {
        PageLayout {
            head: "html",
            ..PageLayout::default()
        }
    }

    fn meta_selectors(&self) -> &MetaSelectors {
        &SELECTORS
    }

    fn after_meta(&self, draft: &mut News, meta: &Meta, page_url: &str) -> Result<(), ParseError> {
        let linked = meta.assign_common(draft, page_url, |u| self.to_guid(u));
        // "title - category - 自由時報電子報"
        let parts: Vec<&str> = meta.title.split(" - ").collect();
        if parts.len() > 1 {
            draft.title = parts[0].trim().to_string();
            draft.category = parts[1].trim().to_string();
        } else {
            draft.title = meta.title.trim().to_string();
        }
        linked
    }

    fn extract_body(&self, news: &mut News, body: ElementRef<'_>) -> ErrorSet {
        let sports = news.source() == Some(SPORTS_HOST);
        let content = if sports {
            Self::sports_paragraphs(body)
        } else {
            Self::news_paragraphs(body)
        };
        news.content.extend(content);

        if let Some(first) = news.content.first() {
            let authors = Self::byline_authors(first);
            if !authors.is_empty() {
                news.author = authors;
            }
        }

        collect_related(
            news,
            body,
            "div.content div.related[data-desc='相關新聞'] a[data-desc]",
            |_| true,
            |u| self.to_guid(u),
        )
    }
}
