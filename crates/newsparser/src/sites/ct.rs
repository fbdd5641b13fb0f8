// ABOUTME: China Times (www.chinatimes.com) extractor.
// ABOUTME: Titles carry the category after " - "; bylines list reporters joined by 、 with unit suffixes.

use once_cell::sync::Lazy;
use scraper::ElementRef;
use url::Url;

use crate::error::{ErrorSet, ParseError};
use crate::extractors::fields::{collect_related, select_all, select_first, text_of};
use crate::extractors::meta::{Meta, MetaField, MetaSelectors};
use crate::extractors::SiteExtractor;
use crate::news::News;

static SELECTORS: Lazy<MetaSelectors> = Lazy::new(|| {
    MetaSelectors::standard()
        .clone()
        .with(MetaField::Description, "meta[name='description']")
});

pub struct ChinaTimes;

/// First reporter of a byline such as `王小明、李大華_台北報導`.
fn byline_author(s: &str) -> String {
    let first = s.split('、').next().unwrap_or(s);
    first.split('_').next().unwrap_or(first).trim().to_string()
}

impl SiteExtractor for ChinaTimes {
    fn name(&self) -> &'static str {
        "chinatimes"
    }

    fn domains(&self) -> &'static [&'static str] {
        &["www.chinatimes.com"]
    }

    fn to_guid(&self, url: &Url) -> String {
        super::path_base(url)
    }

    fn meta_selectors(&self) -> &MetaSelectors {
        &SELECTORS
    }

    fn after_meta(&self, draft: &mut News, meta: &Meta, page_url: &str) -> Result<(), ParseError> {
        let linked = meta.assign_common(draft, page_url, |u| self.to_guid(u));
        let mut parts = meta.title.split(" - ");
        draft.title = parts.next().unwrap_or_default().trim().to_string();
        if let Some(category) = parts.next() {
            draft.category = category.trim().to_string();
        }
        linked
    }

    fn extract_body(&self, news: &mut News, body: ElementRef<'_>) -> ErrorSet {
        let Some(article) = select_first(body, "article.article-box") else {
            return ErrorSet::new();
        };

        if news.author.is_empty() {
            news.author = select_all(article, "div.meta-info-wrapper div.meta-info div.author")
                .into_iter()
                .map(|el| byline_author(&text_of(el)))
                .filter(|a| !a.is_empty())
                .collect();
        }

        for p in select_all(article, "div.article-body[itemprop='articleBody'] p") {
            let text = text_of(p).trim().to_string();
            if !text.is_empty() {
                news.content.push(text);
            }
        }

        collect_related(
            news,
            article,
            "div.article-body[itemprop='articleBody'] div.promote-word a",
            |_| true,
            |u| self.to_guid(u),
        )
    }
}
