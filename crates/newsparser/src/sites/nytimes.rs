// ABOUTME: New York Times Chinese (cn.nytimes.com) extractor.
// ABOUTME: No linked data; byline and category come from meta tags and the canonical path.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::ElementRef;
use url::Url;

use crate::error::{ErrorSet, ParseError};
use crate::extractors::fields::{collect_related, has_match, select_all, text_of};
use crate::extractors::meta::{Meta, MetaField, MetaSelectors};
use crate::extractors::SiteExtractor;
use crate::news::News;
use crate::text::{clean_paragraph, parse_csl};

const TITLE_SUFFIX: &str = " - 紐約時報中文網";

static CATEGORY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"cn.nytimes.com/(\w+)/.+").expect("valid regex"));

static SELECTORS: Lazy<MetaSelectors> = Lazy::new(|| {
    MetaSelectors::empty()
        .with(MetaField::Link, "link[rel='canonical']")
        .with(MetaField::Description, "meta[name='description']")
        .with(MetaField::PubDate, "meta[property='article:published_time']")
        .with(MetaField::Author, "meta#byline[name='byline']")
});

pub struct NyTimes;

impl SiteExtractor for NyTimes {
    fn name(&self) -> &'static str {
        "nytimes"
    }

    fn domains(&self) -> &'static [&'static str] {
        &["cn.nytimes.com"]
    }

    /// `/world/20230905/china-economy/zh-hant/` becomes `world-20230905-china-economy`.
    fn to_guid(&self, url: &Url) -> String {
        let path = url.path();
        let path = path.strip_prefix("/cn.nytimes.com/").unwrap_or(path);
        let path = path.strip_suffix("/zh-hant/").unwrap_or(path);
        path.trim_matches('/').replace('/', "-")
    }

    fn has_linked_data(&self) -> bool {
        false
    }

    fn meta_selectors(&self) -> &MetaSelectors {
        &SELECTORS
    }

    fn after_meta(&self, draft: &mut News, meta: &Meta, page_url: &str) -> Result<(), ParseError> {
        let linked = meta.assign_common(draft, page_url, |u| self.to_guid(u));
        let title = meta.title.trim();
        draft.title = title.strip_suffix(TITLE_SUFFIX).unwrap_or(title).to_string();
        draft.author = parse_csl(&meta.author);
        let link = draft.link.as_ref().map_or(meta.link.as_str(), |u| u.as_str());
        if let Some(category) = CATEGORY_RE.captures(link).map(|c| c[1].to_string()) {
            draft.category = category;
        }
        linked
    }

    fn extract_body(&self, news: &mut News, body: ElementRef<'_>) -> ErrorSet {
        for p in select_all(
            body,
            "main.main div.article-area article.article-content section.article-body div.article-body-item div.article-paragraph",
        ) {
            if has_match(p, "figcaption") {
                continue;
            }
            let text = clean_paragraph(&text_of(p));
            if !text.is_empty() {
                news.content.push(text);
            }
        }

        collect_related(
            news,
            body,
            "main.main div.article-area div.article-footer div.related-cont ul.refer-list li.article-refer div.refer-list-item a",
            |_| true,
            |u| self.to_guid(u),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::process::extract;
    use pretty_assertions::assert_eq;

    const PAGE: &str = r#"<html><head>
<title>中國經濟放緩 - 紐約時報中文網</title>
<link rel="canonical" href="https://cn.nytimes.com/business/20230905/china-economy/zh-hant/">
<meta name="description" content="中國經濟">
<meta id="byline" name="byline" content="KEITH BRADSHER, 王月眉">
<meta property="article:published_time" content="2023-09-05T04:00:00+08:00">
</head><body>
<main class="main"><div class="article-area">
<article class="article-content"><section class="article-body">
  <div class="article-body-item"><div class="article-paragraph">第一段
  文字</div></div>
  <div class="article-body-item"><div class="article-paragraph"><figure><figcaption>圖說</figcaption></figure></div></div>
  <div class="article-body-item"><div class="article-paragraph">第二段</div></div>
</section></article>
<div class="article-footer"><div class="related-cont"><ul class="refer-list"><li class="article-refer"><div class="refer-list-item">
  <a href="https://cn.nytimes.com/world/20230901/ukraine/zh-hant/">r</a>
</div></li></ul></div></div>
</div></main>
</body></html>"#;

    #[test]
    fn guid_trims_language_suffix() {
        let u = Url::parse("https://cn.nytimes.com/world/20230905/china-economy/zh-hant/").unwrap();
        assert_eq!(NyTimes.to_guid(&u), "world-20230905-china-economy");
    }

    #[test]
    fn extracts_page_without_linked_data() {
        let url = Url::parse("https://cn.nytimes.com/business/20230905/china-economy/zh-hant/").unwrap();
        let out = extract(&NyTimes, PAGE, &url).unwrap();
        let n = out.news;
        assert!(out.issues.is_empty(), "{}", out.issues);
        assert_eq!(n.title, "中國經濟放緩");
        assert_eq!(n.category, "business");
        assert_eq!(n.author, vec!["KEITH BRADSHER", "王月眉"]);
        assert_eq!(n.guid, "business-20230905-china-economy");
        assert_eq!(n.content, vec!["第一段 文字", "第二段"]);
        assert_eq!(n.related_guid, vec!["world-20230901-ukraine"]);
    }
}
