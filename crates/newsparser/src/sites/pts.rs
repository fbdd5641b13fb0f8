// ABOUTME: Public Television Service (news.pts.org.tw) extractor.
// ABOUTME: Authors come from linked-data Person entries; the category is the second breadcrumb.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use scraper::ElementRef;
use url::Url;

use crate::error::{ErrorSet, ParseError};
use crate::extractors::fields::{collect_related, select_all, select_first, text_of};
use crate::extractors::ldjson::LinkedData;
use crate::extractors::meta::{Meta, MetaField, MetaSelectors};
use crate::extractors::SiteExtractor;
use crate::news::News;
use crate::text::clean_paragraph_spaced;

const TITLE_SEP: &str = " ｜ ";

static SELECTORS: Lazy<MetaSelectors> = Lazy::new(|| {
    MetaSelectors::empty()
        .with(MetaField::Link, "link[rel='canonical']")
        .with(MetaField::Description, "meta[name='description']")
        .with(MetaField::PubDate, "meta[property='pubdate']")
        .with(MetaField::ModDate, "meta[property='moddate']")
});

pub struct Pts;

/// `title ｜ 公視新聞網 PNN` keeps only the title.
fn short_title(title: &str) -> String {
    match title.split(TITLE_SEP).collect::<Vec<_>>()[..] {
        [head, _] => head.trim().to_string(),
        _ => title.trim().to_string(),
    }
}

fn is_article_link(href: &str) -> bool {
    href.contains("news.pts.org.tw/article")
}

impl SiteExtractor for Pts {
    fn name(&self) -> &'static str {
        "pts"
    }

    fn domains(&self) -> &'static [&'static str] {
        &["news.pts.org.tw"]
    }

    fn to_guid(&self, url: &Url) -> String {
        super::path_base(url)
    }

    fn after_linked_data(&self, draft: &mut News, data: &LinkedData) {
        draft.title = short_title(&data.headline);
        // "王小明 李大華／台北報導" lists several reporters in one name.
        let authors: BTreeSet<String> = data
            .author
            .iter()
            .filter(|a| a.kind.eq_ignore_ascii_case("person"))
            .flat_map(|a| {
                let names = a.name.split('／').next().unwrap_or_default();
                names
                    .split(' ')
                    .map(|n| n.trim().to_string())
                    .collect::<Vec<_>>()
            })
            .filter(|n| !n.is_empty())
            .collect();
        draft.author = authors.into_iter().collect();
    }

    fn meta_selectors(&self) -> &MetaSelectors {
        &SELECTORS
    }

    fn after_meta(&self, draft: &mut News, meta: &Meta, page_url: &str) -> Result<(), ParseError> {
        let linked = meta.assign_common(draft, page_url, |u| self.to_guid(u));
        draft.title = short_title(&meta.title);
        linked
    }

    fn extract_body(&self, news: &mut News, body: ElementRef<'_>) -> ErrorSet {
        let crumbs = select_all(
            body,
            "article nav[aria-label='breadcrumb'] ol.breadcrumb li.breadcrumb-item a",
        );
        if let Some(second) = crumbs.get(1) {
            let category = text_of(*second).trim().to_string();
            if !category.is_empty() {
                news.category = category;
            }
        }

        if let Some(post) = select_first(body, "article.row div.post-article") {
            news.content.clear();
            for el in select_all(post, "p, h2, table tbody tr") {
                let text = clean_paragraph_spaced(&text_of(el));
                if !text.is_empty() {
                    news.content.push(text);
                }
            }
        }

        let mut errors = collect_related(
            news,
            body,
            "div.issue-cords-1 div.d-flex div.issue-item-title h6 a",
            is_article_link,
            |u| self.to_guid(u),
        );
        errors.extend(collect_related(
            news,
            body,
            "div.relative-news-list-content h4.m-0 a",
            is_article_link,
            |u| self.to_guid(u),
        ));
        errors
    }
}
