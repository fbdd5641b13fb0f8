// ABOUTME: Central News Agency (www.cna.com.tw) extractor.
// ABOUTME: GUIDs come from the category code and article number in the path.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::ElementRef;
use url::Url;

use crate::error::{ErrorSet, ParseError};
use crate::extractors::fields::{collect_related, select_all, select_first, text_of};
use crate::extractors::ldjson::{LinkedData, DEFAULT_TARGET_TYPE};
use crate::extractors::meta::{Meta, MetaField, MetaSelectors};
use crate::extractors::SiteExtractor;
use crate::news::News;

static GUID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"news/(\w{3,4})/(\d+)\.aspx").expect("valid regex"));

/// The `about` key sits where schema.org expects `description`.
static ABOUT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""headline":.*?,"(about)":.*?,"url":"#).expect("valid regex"));

/// Editor credit closing the last paragraph, e.g. `。（編輯：李亨山）1120823`.
static AUTHOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"。（(.+?)）\d{6,7}").expect("valid regex"));

static SELECTORS: Lazy<MetaSelectors> = Lazy::new(|| {
    MetaSelectors::empty()
        .with(MetaField::Link, "link[rel='canonical']")
        .with(MetaField::Description, "meta[name='description']")
        .with(
            MetaField::Category,
            "meta[name='section'][property='article:section'][itemprop='articleSection']",
        )
        .with(MetaField::PubDate, "meta[property='article:published_time']")
        .with(MetaField::ModDate, "meta[property='article:modified_time']")
        .with(MetaField::Keywords, "meta[property='article:tag']")
});

pub struct Cna;

impl Cna {
    fn authors(paragraph: &str) -> Option<Vec<String>> {
        let credit = AUTHOR_RE.captures(paragraph)?.get(1)?.as_str();
        let authors = credit
            .split('/')
            .map(|a| match a.split_once('：') {
                Some((_, name)) => name.trim().to_string(),
                None => a.trim().to_string(),
            })
            .filter(|a| !a.is_empty())
            .collect();
        Some(authors)
    }
}

impl SiteExtractor for Cna {
    fn name(&self) -> &'static str {
        "cna"
    }

    fn domains(&self) -> &'static [&'static str] {
        &["www.cna.com.tw"]
    }

    fn to_guid(&self, url: &Url) -> String {
        match GUID_RE.captures(url.path()) {
            Some(c) => format!("{}-{}", &c[1], &c[2]),
            None => super::dashed_path(url),
        }
    }

    fn preprocess_linked_data<'a>(&self, block: &'a str) -> Cow<'a, str> {
        let Some(m) = ABOUT_RE.captures(block).and_then(|c| c.get(1)) else {
            return Cow::Borrowed(block);
        };
        Cow::Owned(format!("{}description{}", &block[..m.start()], &block[m.end()..]))
    }

    fn after_linked_data(&self, draft: &mut News, data: &LinkedData) {
        if let Some(first) = data.author_names().into_iter().next() {
            draft.author.push(first);
        }
        draft.tag.retain(|t| t != DEFAULT_TARGET_TYPE);
    }

    fn meta_selectors(&self) -> &MetaSelectors {
        &SELECTORS
    }

    fn after_meta(&self, draft: &mut News, meta: &Meta, page_url: &str) -> Result<(), ParseError> {
        let linked = meta.assign_common(draft, page_url, |u| self.to_guid(u));
        // "title | category | 中央社 CNA"
        match meta.title.split(" | ").collect::<Vec<_>>()[..] {
            [title, category, _] => {
                draft.title = title.trim().to_string();
                draft.category = category.trim().to_string();
            }
            _ => draft.title = meta.title.trim().to_string(),
        }
        linked
    }

    fn extract_body(&self, news: &mut News, body: ElementRef<'_>) -> ErrorSet {
        let mut errors = ErrorSet::new();
        let mut tags = Vec::new();

        for central in select_all(body, "div.centralContent") {
            let Some(paragraph) = select_first(central, "div.paragraph") else {
                continue;
            };
            for p in select_all(paragraph, "p") {
                let text = text_of(p).trim().to_string();
                if !text.is_empty() {
                    news.content.push(text);
                }
            }
            for a in select_all(paragraph, "div.keywordTag a") {
                let tag = text_of(a);
                tags.push(tag.trim().trim_start_matches('#').trim().to_string());
            }
            errors.extend(collect_related(
                news,
                paragraph,
                "div.moreArticle a.moreArticle-link",
                |href| href.contains("www.cna.com.tw/news"),
                |u| self.to_guid(u),
            ));
        }

        news.add_tags(tags);
        if let Some(authors) = news.content.last().and_then(|last| Self::authors(last)) {
            news.author = authors;
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::process::extract;
    use pretty_assertions::assert_eq;

    const PAGE: &str = r#"<html lang="zh-Hant-TW"><head>
<title>中國單身人口逾2億 專家說因年輕人太宅 | 兩岸 | 中央社 CNA</title>
<link rel="canonical" href="https://www.cna.com.tw/news/acn/202308230192.aspx">
<meta name="description" content="中國年輕未婚單身人口達2.39億人">
<meta property="article:published_time" content="2023-08-23T15:12:00+08:00">
<meta property="article:tag" content="中國,環球時報">
<script type="application/ld+json">{"@context":"http://schema.org","@type":"NewsArticle","headline":"中國單身人口逾2億 專家說因年輕人太宅","about":"中國年輕未婚單身人口","url":"https://www.cna.com.tw/news/acn/202308230192.aspx","keywords":["NewsArticle","中國"],"author":{"@type":"Person","name":"中央社"},"datePublished":"2023-08-23T15:12:00+08:00"}</script>
</head><body>
<div class="centralContent"><div class="paragraph">
<p>（中央社台北23日電）中國年輕未婚單身人口達2.39億人。</p>
<p> </p>
<p>也有部份網友質疑這項統計。（編輯：唐佩君/呂佳蓉）1120823</p>
<div class="keywordTag"><a>#中國</a><a>#環球時報</a></div>
<div class="moreArticle">
<a class="moreArticle-link" href="https://www.cna.com.tw/news/acn/202308230100.aspx">x</a>
<a class="moreArticle-link" href="https://www.cna.com.tw/topic/1">topic</a>
</div>
</div></div>
</body></html>"#;

    #[test]
    fn guid_from_path() {
        let u = Url::parse("https://www.cna.com.tw/news/ahel/202308230179.aspx").unwrap();
        assert_eq!(Cna.to_guid(&u), "ahel-202308230179");
        let u = Url::parse("https://www.cna.com.tw/topic/newstopic/4108.aspx").unwrap();
        assert_eq!(Cna.to_guid(&u), "topic-newstopic-4108.aspx");
    }

    #[test]
    fn renames_about_to_description() {
        let block = r#"{"headline":"h","about":"a","url":"u"}"#;
        assert_eq!(
            Cna.preprocess_linked_data(block),
            r#"{"headline":"h","description":"a","url":"u"}"#
        );
    }

    #[test]
    fn extracts_page() {
        let url = Url::parse("https://www.cna.com.tw/news/acn/202308230192.aspx").unwrap();
        let out = extract(&Cna, PAGE, &url).unwrap();
        let n = out.news;
        assert!(out.issues.is_empty(), "{}", out.issues);
        assert_eq!(n.title, "中國單身人口逾2億 專家說因年輕人太宅");
        assert_eq!(n.category, "兩岸");
        assert_eq!(n.description, "中國年輕未婚單身人口");
        assert_eq!(n.guid, "acn-202308230192");
        assert_eq!(n.author, vec!["唐佩君", "呂佳蓉"]);
        assert_eq!(n.tag, vec!["中國", "環球時報"]);
        assert_eq!(n.content.len(), 2);
        assert_eq!(n.related_guid, vec!["acn-202308230100"]);
        assert_eq!(n.language, "zh-Hant-TW");
        assert!(n.pub_date.is_some());
    }

    #[test]
    fn editor_credit_variants() {
        assert_eq!(
            Cna::authors("結尾。（譯者：王嘉語/核稿：嚴思祺）1120823").unwrap(),
            vec!["王嘉語", "嚴思祺"]
        );
        assert!(Cna::authors("沒有署名").is_none());
    }
}
