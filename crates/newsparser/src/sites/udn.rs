// ABOUTME: United Daily News (udn.com, global.udn.com) extractor.
// ABOUTME: The global edition uses an older story layout with its own author and related-news blocks.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::ElementRef;
use url::Url;

use crate::error::{ErrorSet, ParseError};
use crate::extractors::fields::{collect_related, select_all, text_of};
use crate::extractors::meta::{Meta, MetaField, MetaSelectors, SelectorBuilder};
use crate::extractors::SiteExtractor;
use crate::news::News;
use crate::text::clean_paragraph;

const GLOBAL_HOST: &str = "global.udn.com";

static GUID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[a-z]+/[a-z]+/([0-9]{4,7})/([0-9]{4,8})").expect("valid regex"));

static SELECTORS: Lazy<MetaSelectors> = Lazy::new(|| {
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
        .with(MetaField::Keywords, meta(&[("itemprop", "keywords")]))
});

pub struct Udn;

fn paragraphs(root: ElementRef<'_>, css: &str) -> Vec<String> {
    select_all(root, css)
        .into_iter()
        .map(|p| clean_paragraph(&text_of(p)))
        .filter(|s| !s.is_empty())
        .collect()
}

fn names(root: ElementRef<'_>, css: &str) -> Vec<String> {
    select_all(root, css)
        .into_iter()
        .map(|el| text_of(el).trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl Udn {
    fn global_body(&self, news: &mut News, body: ElementRef<'_>) -> ErrorSet {
        news.content
            .extend(paragraphs(body, "div#story_body div.story_body_content > p"));
        news.author
            .extend(names(body, "div#story_bady_info > span"));
        collect_related(
            news,
            body,
            "div#story_also dt a[data-slotname='list_推薦閱讀']",
            |_| true,
            |u| self.to_guid(u),
        )
    }

    fn domestic_body(&self, news: &mut News, body: ElementRef<'_>) -> ErrorSet {
        let authors = names(body, "section.authors span.article-content__author > a");
        if !authors.is_empty() {
            news.author = authors;
        }
        news.content.extend(paragraphs(
            body,
            "article.article-content div.article-content__paragraph p",
        ));
        collect_related(
            news,
            body,
            "section.more-news div.context-box__content div.story-list__news div.story-list__text a",
            |_| true,
            |u| self.to_guid(u),
        )
    }
}

impl SiteExtractor for Udn {
    fn name(&self) -> &'static str {
        "udn"
    }

    fn domains(&self) -> &'static [&'static str] {
        &["udn.com", GLOBAL_HOST]
    }

    /// `/news/story/123707/7398504` becomes `123707-7398504`.
    fn to_guid(&self, url: &Url) -> String {
        match GUID_RE.captures(url.path()) {
            Some(c) => format!("{}-{}", &c[1], &c[2]),
            None => url.path().replace('/', "-"),
        }
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
        if news.source() == Some(GLOBAL_HOST) {
            self.global_body(news, body)
        } else {
            self.domestic_body(news, body)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::process::extract;
    use pretty_assertions::assert_eq;

    const PAGE: &str = r#"<html><head>
<title>立委補選 藍綠拚戰 | 政治焦點 | 政治 | 聯合新聞網</title>
<link rel="canonical" href="https://udn.com/news/story/6656/7398504">
<meta name="section" property="article:section" itemprop="articleSection" content="政治">
<meta itemprop="keywords" content="立委,補選">
<script type="application/ld+json">{"@type":"NewsArticle","headline":"立委補選 藍綠拚戰","url":"https://udn.com/news/story/6656/7398504","author":{"@type":"Person","name":"聯合報"}}</script>
</head><body>
<section class="authors"><span class="article-content__author"><a>王小明</a></span></section>
<article class="article-content"><div class="article-content__paragraph">
  <p>第一段</p><p></p><p>第二段</p>
</div></article>
<section class="more-news"><div class="context-box__content"><div class="story-list__news"><div class="story-list__text">
  <a href="/news/story/6656/7390001">x</a>
</div></div></div></section>
</body></html>"#;

    const GLOBAL_PAGE: &str = r#"<html><head>
<title>轉角國際 | 烏克蘭戰爭</title>
<link rel="canonical" href="https://global.udn.com/global_vision/story/8662/7398000">
</head><body>
<div id="story_bady_info"><span>陳小華</span></div>
<div id="story_body"><div class="story_body_content"><p>國際段落</p></div></div>
<div id="story_also"><dl><dt><a data-slotname="list_推薦閱讀" href="https://global.udn.com/global_vision/story/8662/7390000">r</a></dt></dl></div>
</body></html>"#;

    #[test]
    fn guid_rules() {
        let u = Url::parse("https://udn.com/news/story/123707/7398504").unwrap();
        assert_eq!(Udn.to_guid(&u), "123707-7398504");
        let u = Url::parse("https://udn.com/news/breaknews/1").unwrap();
        assert_eq!(Udn.to_guid(&u), "-news-breaknews-1");
    }

    #[test]
    fn extracts_domestic_page() {
        let url = Url::parse("https://udn.com/news/story/6656/7398504").unwrap();
        let n = extract(&Udn, PAGE, &url).unwrap().news;
        assert_eq!(n.title, "立委補選 藍綠拚戰");
        assert_eq!(n.category, "政治");
        assert_eq!(n.guid, "6656-7398504");
        assert_eq!(n.author, vec!["王小明"]);
        assert_eq!(n.content, vec!["第一段", "第二段"]);
        assert_eq!(n.related_guid, vec!["6656-7390001"]);
    }

    #[test]
    fn extracts_global_page() {
        let url = Url::parse("https://global.udn.com/global_vision/story/8662/7398000").unwrap();
        let n = extract(&Udn, GLOBAL_PAGE, &url).unwrap().news;
        assert_eq!(n.title, "轉角國際 | 烏克蘭戰爭");
        assert_eq!(n.author, vec!["陳小華"]);
        assert_eq!(n.content, vec!["國際段落"]);
        assert_eq!(n.related_guid, vec!["8662-7390000"]);
    }
}
