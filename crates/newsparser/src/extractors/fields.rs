// ABOUTME: DOM helpers over scraper for selecting elements, reading text and attributes.
// ABOUTME: Also resolves related-article hrefs into GUIDs while aggregating malformed links.

//! DOM field helpers.
//!
//! Thin wrappers around `scraper` used by the meta framework and the site
//! body extractors. Selectors go through the shared cache; an invalid
//! selector simply matches nothing.

use ego_tree::iter::Edge;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::{ErrorSet, ParseError};
use crate::extractors::compiled::get_or_compile;
use crate::news::News;

/// All descendants of `root` matching `css`, in document order.
pub fn select_all<'a>(root: ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
    match get_or_compile(css) {
        Some(sel) => root.select(&sel).collect(),
        None => Vec::new(),
    }
}

/// The first descendant of `root` matching `css`.
pub fn select_first<'a>(root: ElementRef<'a>, css: &str) -> Option<ElementRef<'a>> {
    let sel = get_or_compile(css)?;
    let first = root.select(&sel).next();
    first
}

/// The first element of the whole document matching `css`.
pub fn document_first<'a>(doc: &'a Html, css: &str) -> Option<ElementRef<'a>> {
    let sel = get_or_compile(css)?;
    let first = doc.select(&sel).next();
    first
}

/// All elements of the whole document matching `css`.
pub fn document_all<'a>(doc: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    match get_or_compile(css) {
        Some(sel) => doc.select(&sel).collect(),
        None => Vec::new(),
    }
}

/// Returns true if any descendant of `root` matches `css`.
pub fn has_match(root: ElementRef<'_>, css: &str) -> bool {
    select_first(root, css).is_some()
}

/// Concatenated text of every text node below `el`.
pub fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect()
}

/// Attribute value of `el`, if present.
pub fn attr_of<'a>(el: ElementRef<'a>, name: &str) -> Option<&'a str> {
    el.value().attr(name)
}

/// The `lang` attribute of the outer `<html>` element.
pub fn html_lang(doc: &Html) -> Option<String> {
    doc.root_element()
        .value()
        .attr("lang")
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
}

/// Text below `root`, skipping every subtree whose element matches one of `excluded`.
pub fn text_excluding(root: ElementRef<'_>, excluded: &[&str]) -> String {
    let selectors: Vec<Selector> = excluded.iter().filter_map(|css| get_or_compile(css)).collect();
    let mut out = String::new();
    let mut skip_depth = 0usize;

    for edge in root.traverse() {
        match edge {
            Edge::Open(node) => {
                if skip_depth > 0 {
                    if node.value().is_element() {
                        skip_depth += 1;
                    }
                    continue;
                }
                if let Some(el) = ElementRef::wrap(node) {
                    if el.id() != root.id() && selectors.iter().any(|s| s.matches(&el)) {
                        skip_depth = 1;
                        continue;
                    }
                }
                if let Some(text) = node.value().as_text() {
                    out.push_str(text);
                }
            }
            Edge::Close(node) => {
                if skip_depth > 0 && node.value().is_element() {
                    skip_depth -= 1;
                }
            }
        }
    }
    out
}

/// Resolves `href` against the article link, accepting absolute and relative forms.
pub fn resolve_href(base: Option<&Url>, href: &str) -> Result<Url, url::ParseError> {
    match base {
        Some(base) => base.join(href.trim()),
        None => Url::parse(href.trim()),
    }
}

/// Collects related-article GUIDs from the `href` of every element matching `css`.
///
/// Links rejected by `keep` are ignored. Links that fail to resolve are
/// recorded in the returned set and do not stop the remaining links.
pub fn collect_related<K, G>(
    news: &mut News,
    root: ElementRef<'_>,
    css: &str,
    keep: K,
    to_guid: G,
) -> ErrorSet
where
    K: Fn(&str) -> bool,
    G: Fn(&Url) -> String,
{
    let mut errors = ErrorSet::new();
    for el in select_all(root, css) {
        let Some(href) = attr_of(el, "href") else {
            continue;
        };
        if !keep(href) {
            continue;
        }
        match resolve_href(news.link.as_ref(), href) {
            Ok(u) => {
                let guid = to_guid(&u);
                news.add_related(guid);
            }
            Err(e) => errors.add(
                href,
                ParseError::related_link(
                    href,
                    "ParseBody",
                    Some(anyhow::anyhow!("error while parsing {}: {}", href, e)),
                ),
            ),
        }
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PAGE: &str = r#"<html lang="zh-Hant-TW"><head><title>t</title></head>
<body>
  <div id="main">
    <p>one</p>
    <div align="center"><p>ad <b>copy</b></p></div>
    <p>two</p>
    <div class="img">caption</div>
  </div>
  <ul class="rel">
    <li><a href="/news/a/1.aspx">a</a></li>
    <li><a href="https://other.example/b/2">b</a></li>
    <li><a href="http://[::1">broken</a></li>
    <li><a>no href</a></li>
  </ul>
</body></html>"#;

    #[test]
    fn reads_html_lang() {
        let doc = Html::parse_document(PAGE);
        assert_eq!(html_lang(&doc).as_deref(), Some("zh-Hant-TW"));
        let doc = Html::parse_document("<html><body></body></html>");
        assert_eq!(html_lang(&doc), None);
    }

    #[test]
    fn skips_excluded_subtrees() {
        let doc = Html::parse_document(PAGE);
        let main = document_first(&doc, "div#main").unwrap();
        let text = text_excluding(main, &["div[align='center']", "div.img"]);
        assert!(text.contains("one"));
        assert!(text.contains("two"));
        assert!(!text.contains("ad"));
        assert!(!text.contains("copy"));
        assert!(!text.contains("caption"));
    }

    #[test]
    fn collects_related_and_aggregates_bad_links() {
        let doc = Html::parse_document(PAGE);
        let body = document_first(&doc, "body").unwrap();
        let mut news = News {
            link: Url::parse("https://www.example.com/news/x/0.aspx").ok(),
            ..Default::default()
        };
        let errors = collect_related(&mut news, body, "ul.rel a", |_| true, |u| {
            u.path().trim_start_matches('/').replace('/', "-")
        });
        assert_eq!(news.related_guid, vec!["news-a-1.aspx", "b-2"]);
        assert_eq!(errors.len(), 1);
        assert!(errors.get("http://[::1").unwrap().is_related_link());
    }

    #[test]
    fn invalid_selector_matches_nothing() {
        let doc = Html::parse_document(PAGE);
        assert!(document_all(&doc, "p[[").is_empty());
        assert_eq!(document_all(&doc, "div#main > p").len(), 2);
    }
}
