// ABOUTME: SET News (www.setn.com) extractor.
// ABOUTME: GUIDs are the NewsID query parameter; publish times are local and carry no offset.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::ElementRef;
use url::Url;

use crate::error::{ErrorSet, ParseError};
use crate::extractors::fields::{attr_of, collect_related, select_all, text_of};
use crate::extractors::meta::{Meta, MetaField, MetaSelectors};
use crate::extractors::SiteExtractor;
use crate::news::News;
use crate::text::{collapse_spaces, strip_hidden_chars};

const TAIPEI_OFFSET: &str = "+08:00";

static CENTER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r".{2,4}中心／(.+)報導$").expect("valid regex"));
static WRITER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"文／(.+)").expect("valid regex"));

static SELECTORS: Lazy<MetaSelectors> = Lazy::new(|| {
    MetaSelectors::empty()
        .with(MetaField::Link, "link[rel='canonical']")
        .with(MetaField::Description, "meta[name='Description']")
        .with(MetaField::Language, "meta[http-equiv='content-language']")
        .with(MetaField::Category, "meta[property='article:section']")
        .with(MetaField::PubDate, "meta[name='pubdate']")
        .with(MetaField::ModDate, "meta[name='moddate']")
        .with(
            MetaField::Keywords,
            "meta[name='news_keywords'][itemprop='keywords']",
        )
});

pub struct Setn;

/// Bylines seen on the site: `社會中心／王小明報導`, `文／王小明`, `記者王小明／台北報導`.
fn byline_authors(s: &str) -> Vec<String> {
    if let Some(c) = CENTER_RE.captures(s) {
        return c[1].split('、').map(|a| a.trim().to_string()).collect();
    }
    if let Some(c) = WRITER_RE.captures(s) {
        return vec![c[1].to_string()];
    }
    let names = s.split('／').next().unwrap_or_default();
    names
        .split('、')
        .map(|a| a.strip_prefix("記者").unwrap_or(a).trim().to_string())
        .collect()
}

fn is_centered(p: ElementRef<'_>) -> bool {
    matches!(
        attr_of(p, "style"),
        Some("text-align: center;") | Some("text-align:center;")
    )
}

impl SiteExtractor for Setn {
    fn name(&self) -> &'static str {
        "setn"
    }

    fn domains(&self) -> &'static [&'static str] {
        &["www.setn.com"]
    }

    fn to_guid(&self, url: &Url) -> String {
        super::query_value(url, "NewsID")
    }

    fn meta_selectors(&self) -> &MetaSelectors {
        &SELECTORS
    }

    fn after_meta(&self, draft: &mut News, meta: &Meta, page_url: &str) -> Result<(), ParseError> {
        let linked = meta.assign_common(draft, page_url, |u| self.to_guid(u));
        draft.pub_date = meta.published_with_offset(TAIPEI_OFFSET);
        let parts: Vec<&str> = meta.title.split(" | ").collect();
        draft.title = if parts.len() >= 3 {
            strip_hidden_chars(parts[0]).trim().to_string()
        } else {
            meta.title.trim().to_string()
        };
        linked
    }

    fn extract_body(&self, news: &mut News, body: ElementRef<'_>) -> ErrorSet {
        for p in select_all(body, "div#ckuse article div > p") {
            if is_centered(p) {
                continue;
            }
            let text = text_of(p);
            if text.chars().next().map_or(true, |c| c == '▸' || c == '▲') {
                continue;
            }
            if news.author.is_empty() {
                news.author = byline_authors(&text);
                continue;
            }
            let text = collapse_spaces(strip_hidden_chars(&text).trim());
            if !text.is_empty() && !text.starts_with("延伸閱讀") {
                news.content.push(text);
            }
        }

        collect_related(
            news,
            body,
            "div.tagNewsArea div.tagNewsBox div.tagNews a.gt",
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
<title>海葵颱風逼近 全台嚴陣以待 | 生活 | 三立新聞網 | SETN.COM</title>
<link rel="canonical" href="https://www.setn.com/News.aspx?NewsID=1348480">
<meta name="Description" content="海葵颱風逼近">
<meta http-equiv="content-language" content="zh-TW">
<meta property="article:section" content="生活">
<meta name="pubdate" content="2023-09-02T10:00:00">
</head><body>
<div id="ckuse"><article><div>
  <p>生活中心／王小明、李大華報導</p>
  <p style="text-align: center;">圖片說明</p>
  <p>▲颱風路徑圖。</p>
  <p>海葵颱風   持續逼近。</p>
  <p>延伸閱讀：其他颱風新聞</p>
</div></article></div>
<div class="tagNewsArea"><div class="tagNewsBox"><div class="tagNews">
  <a class="gt" href="/News.aspx?NewsID=1348000">x</a>
</div></div></div>
</body></html>"#;

    #[test]
    fn byline_variants() {
        assert_eq!(byline_authors("文／王小明"), vec!["王小明"]);
        assert_eq!(byline_authors("記者王小明／台北報導"), vec!["王小明"]);
        assert_eq!(
            byline_authors("政治中心／王小明、李大華報導"),
            vec!["王小明", "李大華"]
        );
    }

    #[test]
    fn extracts_page() {
        let url = Url::parse("https://www.setn.com/News.aspx?NewsID=1348480").unwrap();
        let out = extract(&Setn, PAGE, &url).unwrap();
        let n = out.news;
        assert!(out.issues.is_empty(), "{}", out.issues);
        assert_eq!(n.title, "海葵颱風逼近 全台嚴陣以待");
        assert_eq!(n.guid, "1348480");
        assert_eq!(n.language, "zh-TW");
        assert_eq!(n.author, vec!["王小明", "李大華"]);
        assert_eq!(n.content, vec!["海葵颱風 持續逼近。"]);
        assert_eq!(n.related_guid, vec!["1348000"]);
        assert_eq!(
            n.pub_date.map(|d| d.to_rfc3339()),
            Some("2023-09-02T02:00:00+00:00".to_string())
        );
    }
}
