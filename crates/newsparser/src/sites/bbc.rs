// ABOUTME: BBC Chinese (www.bbc.com, www.bbc.co.uk) extractor.
// ABOUTME: Linked data is a JSON array of graph nodes; the article node is cut out before decoding.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::ElementRef;
use url::Url;

use crate::error::{ErrorSet, ParseError};
use crate::extractors::fields::{collect_related, select_all, text_of};
use crate::extractors::ldjson::{find_target, LinkedData, DEFAULT_TARGET_TYPE};
use crate::extractors::meta::{Meta, MetaField, MetaSelectors};
use crate::extractors::SiteExtractor;
use crate::news::News;
use crate::text::clean_paragraph;

const TITLE_SUFFIX: &str = " - BBC News 中文";

static CATEGORY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"zhongwen/trad/(.+)-[0-9]{7,10}$").expect("valid regex"));

static SELECTORS: Lazy<MetaSelectors> = Lazy::new(|| {
    MetaSelectors::empty()
        .with(MetaField::Link, "link[rel='canonical']")
        .with(MetaField::Description, "meta[name='description']")
        .with(MetaField::PubDate, "meta[name='article:published_time']")
        .with(MetaField::ModDate, "meta[name='article:modified_time']")
        .with(MetaField::Keywords, "meta[name='article:tag']")
});

pub struct Bbc;

impl SiteExtractor for Bbc {
    fn name(&self) -> &'static str {
        "bbc"
    }

    fn domains(&self) -> &'static [&'static str] {
        &["www.bbc.com", "www.bbc.co.uk"]
    }

    fn to_guid(&self, url: &Url) -> String {
        super::path_base(url)
    }

    /// Narrows an `@graph`-style array down to the article object.
    fn preprocess_linked_data<'a>(&self, block: &'a str) -> Cow<'a, str> {
        let scope = match (block.find('['), block.rfind(']')) {
            (Some(start), Some(end)) if start < end => &block[start..=end],
            _ => block,
        };
        match find_target(scope, DEFAULT_TARGET_TYPE) {
            Some(obj) => Cow::Borrowed(obj),
            None => Cow::Borrowed("{}"),
        }
    }

    fn after_linked_data(&self, draft: &mut News, data: &LinkedData) {
        draft.tag = data
            .about
            .iter()
            .map(|a| a.name.trim().to_string())
            .filter(|n| !n.is_empty())
            .collect();
    }

    fn meta_selectors(&self) -> &MetaSelectors {
        &SELECTORS
    }

    fn after_meta(&self, draft: &mut News, meta: &Meta, page_url: &str) -> Result<(), ParseError> {
        let linked = meta.assign_common(draft, page_url, |u| self.to_guid(u));
        let title = meta.title.trim();
        draft.title = title.strip_suffix(TITLE_SUFFIX).unwrap_or(title).to_string();
        let link = draft.link.as_ref().map_or(meta.link.trim(), |u| u.as_str());
        if let Some(category) = CATEGORY_RE.captures(link).map(|c| c[1].to_string()) {
            draft.category = category;
        }
        linked
    }

    fn extract_body(&self, news: &mut News, body: ElementRef<'_>) -> ErrorSet {
        let authors: Vec<String> = select_all(
            body,
            "main[role='main'] div[dir='ltr'] div.bbc-1atl7vu.euvj3t14 ul.bbc-143s8qx[role='list'] li",
        )
        .into_iter()
        .map(|li| text_of(li).trim().to_string())
        .filter(|a| !a.is_empty() && !a.starts_with("BBC"))
        .collect();
        if !authors.is_empty() {
            news.author = authors;
        }

        for el in select_all(
            body,
            "main[role='main'] div.bbc-19j92fr[dir='ltr'] > p.bbc-w2hm1d, main[role='main'] div.bbc-19j92fr[dir='ltr'] > h2.bbc-z6r16b",
        ) {
            let text = clean_paragraph(&text_of(el));
            if !text.is_empty() {
                news.content.push(text);
            }
        }

        let mut errors = collect_related(
            news,
            body,
            "main[role='main'] div.etpldq00 ul li a.focusIndicatorReducedWidth",
            |_| true,
            |u| self.to_guid(u),
        );
        errors.extend(collect_related(
            news,
            body,
            "section[data-e2e='related-content-heading'] ul li a",
            |_| true,
            |u| self.to_guid(u),
        ));
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::process::extract;
    use pretty_assertions::assert_eq;

    const PAGE: &str = r#"<html lang="zh-hant"><head>
<title>華為新手機引發熱議 - BBC News 中文</title>
<link rel="canonical" href="https://www.bbc.com/zhongwen/trad/chinese-news-66748432">
<meta name="description" content="華為發布新手機">
<meta name="article:published_time" content="2023-09-05T08:30:00.000Z">
<script type="application/ld+json">{"@context":"http://schema.org","@graph":[{"@type":"WebPage","url":"x"},{"@type":"NewsArticle","headline":"華為新手機引發熱議","url":"https://www.bbc.com/zhongwen/trad/chinese-news-66748432","about":[{"@type":"Thing","name":"中國"},{"@type":"Thing","name":"科技"}]}]}</script>
</head><body>
<main role="main">
  <div dir="ltr"><div class="bbc-1atl7vu euvj3t14"><ul class="bbc-143s8qx" role="list">
    <li>王小明</li><li>BBC中文記者</li>
  </ul></div></div>
  <div class="bbc-19j92fr" dir="ltr"><p class="bbc-w2hm1d">第一段</p></div>
  <div class="bbc-19j92fr" dir="ltr"><h2 class="bbc-z6r16b">小標</h2></div>
  <div class="bbc-19j92fr" dir="ltr"><p class="bbc-w2hm1d">第二段</p></div>
  <div class="etpldq00"><ul><li><a class="focusIndicatorReducedWidth" href="/zhongwen/trad/world-66700000">r</a></li></ul></div>
</main>
<section data-e2e="related-content-heading"><ul><li><a href="https://www.bbc.com/zhongwen/trad/chinese-news-66700001">s</a></li></ul></section>
</body></html>"#;

    #[test]
    fn narrows_graph_to_article() {
        let block = r#"{"@graph":[{"@type":"WebPage"},{"@type":"NewsArticle","headline":"h"}]}"#;
        assert_eq!(
            Bbc.preprocess_linked_data(block),
            r#"{"@type":"NewsArticle","headline":"h"}"#
        );
        assert_eq!(Bbc.preprocess_linked_data(r#"[{"@type":"WebPage"}]"#), "{}");
    }

    #[test]
    fn extracts_page() {
        let url = Url::parse("https://www.bbc.com/zhongwen/trad/chinese-news-66748432").unwrap();
        let out = extract(&Bbc, PAGE, &url).unwrap();
        let n = out.news;
        assert!(out.issues.is_empty(), "{}", out.issues);
        assert_eq!(n.title, "華為新手機引發熱議");
        assert_eq!(n.category, "chinese-news");
        assert_eq!(n.guid, "chinese-news-66748432");
        assert_eq!(n.tag, vec!["中國", "科技"]);
        assert_eq!(n.author, vec!["王小明"]);
        assert_eq!(n.content, vec!["第一段", "小標", "第二段"]);
        assert_eq!(n.related_guid, vec!["world-66700000", "chinese-news-66700001"]);
        assert!(n.pub_date.is_some());
    }
}
