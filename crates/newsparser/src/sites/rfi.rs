// ABOUTME: Radio France Internationale Chinese (www.rfi.fr) extractor.
// ABOUTME: Article slugs are long and percent-encoded, so GUIDs are a truncated MD5 of the slug.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use md5::{Digest, Md5};
use once_cell::sync::Lazy;
use scraper::ElementRef;
use url::Url;

use crate::error::{ErrorSet, ParseError};
use crate::extractors::fields::{attr_of, collect_related, select_all, select_first, text_of};
use crate::extractors::meta::{Meta, MetaField, MetaSelectors};
use crate::extractors::SiteExtractor;
use crate::news::News;
use crate::text::clean_paragraph;

static SELECTORS: Lazy<MetaSelectors> = Lazy::new(|| {
    MetaSelectors::empty()
        .with(MetaField::Link, "link[rel='canonical']")
        .with(MetaField::Description, "meta[name='description']")
        .with(MetaField::Category, "meta[property='article:section']")
        .with(MetaField::PubDate, "meta[property='article:published_time']")
        .with(MetaField::ModDate, "meta[property='article:modified_time']")
        .with(MetaField::Keywords, "meta[name='keywords']")
});

pub struct Rfi;

impl SiteExtractor for Rfi {
    fn name(&self) -> &'static str {
        "rfi"
    }

    fn domains(&self) -> &'static [&'static str] {
        &["www.rfi.fr"]
    }

    /// First 15 bytes of the slug's MD5, base64 encoded (20 characters).
    fn to_guid(&self, url: &Url) -> String {
        let digest = Md5::digest(super::path_base(url).as_bytes());
        STANDARD.encode(&digest[..15])
    }

    fn meta_selectors(&self) -> &MetaSelectors {
        &SELECTORS
    }

    fn after_meta(&self, draft: &mut News, meta: &Meta, page_url: &str) -> Result<(), ParseError> {
        let linked = meta.assign_common(draft, page_url, |u| self.to_guid(u));
        draft.title = meta.title.trim().to_string();
        linked
    }

    fn extract_body(&self, news: &mut News, body: ElementRef<'_>) -> ErrorSet {
        let Some(article) = select_first(body, "main article") else {
            return ErrorSet::new();
        };

        if let Some(author) = select_first(article, "div.m-from-author a")
            .and_then(|a| attr_of(a, "title"))
            .map(str::trim)
            .filter(|a| !a.is_empty())
        {
            news.author = vec![author.to_string()];
        }

        for p in select_all(article, "div.t-content__body > p") {
            let text = clean_paragraph(&text_of(p));
            if !text.is_empty() {
                news.content.push(text);
            }
        }

        collect_related(
            news,
            article,
            "div.t-content__tags ul.m-tags-list li.m-tags-list__tag a",
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
<title>  華為新機突破美國制裁？  </title>
<link rel="canonical" href="https://www.rfi.fr/tw/中國/20230905-華為新機">
<meta property="article:section" content="中國">
<meta name="keywords" content="華為,晶片">
</head><body>
<main><article>
  <div class="m-from-author"><a title="法廣">RFI</a></div>
  <div class="t-content__body"><p>第一段</p><p>  </p><p>第二段</p></div>
  <div class="t-content__tags"><ul class="m-tags-list"><li class="m-tags-list__tag"><a href="/tw/tag/華為/">華為</a></li></ul></div>
</article></main>
</body></html>"#;

    #[test]
    fn guid_is_a_fixed_length_digest() {
        let u = Url::parse("https://www.rfi.fr/tw/中國/20230905-華為新機").unwrap();
        let guid = Rfi.to_guid(&u);
        assert_eq!(guid.len(), 20);
        let other = Url::parse("https://www.rfi.fr/tw/國際/20230905-華為新機").unwrap();
        assert_eq!(Rfi.to_guid(&other), guid);
    }

    #[test]
    fn extracts_page() {
        let url = Url::parse("https://www.rfi.fr/tw/中國/20230905-華為新機").unwrap();
        let n = extract(&Rfi, PAGE, &url).unwrap().news;
        assert_eq!(n.title, "華為新機突破美國制裁？");
        assert_eq!(n.category, "中國");
        assert_eq!(n.author, vec!["法廣"]);
        assert_eq!(n.content, vec!["第一段", "第二段"]);
        assert_eq!(n.tag, vec!["晶片", "華為"]);
        assert_eq!(n.related_guid.len(), 1);
    }
}
