// ABOUTME: Up Media (www.upmedia.mg) extractor.
// ABOUTME: No linked data; GUIDs combine the Type and SerialNo query parameters.

use once_cell::sync::Lazy;
use scraper::ElementRef;
use url::Url;

use crate::error::{ErrorSet, ParseError};
use crate::extractors::fields::{collect_related, select_all, text_of};
use crate::extractors::meta::{Meta, MetaField, MetaSelectors};
use crate::extractors::SiteExtractor;
use crate::news::News;

const TAIPEI_OFFSET: &str = "+08:00";
const FLASH_PREFIX: &str = "上報快訊／";
const COLUMN_FOOTER: &str = "作者為《上報》總主筆";

static SELECTORS: Lazy<MetaSelectors> = Lazy::new(|| {
    MetaSelectors::empty()
        .with(MetaField::Link, "link[rel='canonical']")
        .with(MetaField::Description, "meta[name='description']")
        .with(MetaField::Category, "meta[itemprop='articleSection']")
        .with(MetaField::PubDate, "meta[itemprop='datePublished']")
        .with(MetaField::ModDate, "meta[itemprop='dateModified']")
        .with(MetaField::Keywords, "meta[itemprop='keywords']")
});

pub struct UpMedia;

impl SiteExtractor for UpMedia {
    fn name(&self) -> &'static str {
        "upmedia"
    }

    fn domains(&self) -> &'static [&'static str] {
        &["www.upmedia.mg"]
    }

    fn to_guid(&self, url: &Url) -> String {
        format!(
            "{}-{}",
            super::query_value(url, "Type"),
            super::query_value(url, "SerialNo")
        )
    }

    fn has_linked_data(&self) -> bool {
        false
    }

    fn meta_selectors(&self) -> &MetaSelectors {
        &SELECTORS
    }

    fn after_meta(&self, draft: &mut News, meta: &Meta, page_url: &str) -> Result<(), ParseError> {
        let linked = meta.assign_common(draft, page_url, |u| self.to_guid(u));
        draft.pub_date = meta.published_with_offset(TAIPEI_OFFSET);
        draft.title = match meta.title.split("--").collect::<Vec<_>>()[..] {
            [title, _] => title.trim().to_string(),
            _ => meta.title.trim().to_string(),
        };
        linked
    }

    fn extract_body(&self, news: &mut News, body: ElementRef<'_>) -> ErrorSet {
        let authors: Vec<String> = select_all(body, "div#news-info div.author > a")
            .into_iter()
            .map(|a| {
                let name = text_of(a);
                let name = name.trim();
                name.strip_prefix(FLASH_PREFIX).unwrap_or(name).trim().to_string()
            })
            .filter(|a| !a.is_empty())
            .collect();
        if !authors.is_empty() {
            news.author = authors;
        }

        for p in select_all(body, "div#news-info div.editor > p") {
            let text = text_of(p).trim().to_string();
            if !text.is_empty() && !text.contains(COLUMN_FOOTER) {
                news.content.push(text);
            }
        }

        collect_related(
            news,
            body,
            "div#news-info div.related ul li > a",
            |_| true,
            |u| self.to_guid(u),
        )
    }
}
