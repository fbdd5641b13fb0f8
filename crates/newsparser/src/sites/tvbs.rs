// ABOUTME: TVBS News (news.tvbs.com.tw) extractor.
// ABOUTME: Article text is loose inside one container, so it is read as lines with ads and images skipped.

use once_cell::sync::Lazy;
use scraper::ElementRef;
use url::Url;

use crate::error::{ErrorSet, ParseError};
use crate::extractors::fields::text_excluding;
use crate::extractors::ldjson::LinkedData;
use crate::extractors::meta::{Meta, MetaField, MetaSelectors};
use crate::extractors::{PageLayout, SiteExtractor};
use crate::news::News;
use crate::text::split_lines;

const TITLE_SEP: char = '│';

static SELECTORS: Lazy<MetaSelectors> = Lazy::new(|| {
    MetaSelectors::empty()
        .with(MetaField::Link, "link[rel='canonical']")
        .with(MetaField::Description, "meta[name='description']")
        .with(MetaField::Language, "meta[http-equiv='content-language']")
        .with(
            MetaField::Category,
            "meta[name='section'][property='article:section'][itemprop='articleSection']",
        )
        .with(
            MetaField::PubDate,
            "meta[name='pubdate'][property='article:published_time']",
        )
        .with(
            MetaField::ModDate,
            "meta[name='moddate'][property='article:modified_time']",
        )
        .with(MetaField::Keywords, "meta[name='keywords'][itemprop='keywords']")
});

pub struct Tvbs;

fn short_title(title: &str) -> String {
    title.split(TITLE_SEP).next().unwrap_or_default().trim().to_string()
}

impl SiteExtractor for Tvbs {
    fn name(&self) -> &'static str {
        "tvbs"
    }

    fn domains(&self) -> &'static [&'static str] {
        &["news.tvbs.com.tw"]
    }

    /// `/world/2226104` becomes `world-2226104`.
    fn to_guid(&self, url: &Url) -> String {
        let path = url.path();
        path.strip_prefix('/').unwrap_or(path).replacen('/', "-", 1)
    }

    fn layout(&self) -> PageLayout {
        PageLayout {
            body: "div#news_detail_div",
            ..PageLayout::default()
        }
    }

    fn after_linked_data(&self, draft: &mut News, data: &LinkedData) {
        draft.title = short_title(&data.headline);
        draft.author.extend(
            data.author
                .iter()
                .filter(|a| a.kind == "Person")
                .map(|a| a.name.trim().to_string())
                .filter(|n| !n.is_empty()),
        );
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
        let text = text_excluding(body, &["div[align='center']", "div.img", "div.guangxuan"]);
        news.content.extend(split_lines(&text));
        ErrorSet::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::process::extract;
    use pretty_assertions::assert_eq;

    const PAGE: &str = "<html><head>
<title>美國就業數據出爐│TVBS新聞網</title>
<link rel=\"canonical\" href=\"https://news.tvbs.com.tw/world/2226104\">
<meta name=\"section\" property=\"article:section\" itemprop=\"articleSection\" content=\"國際\">
<script type=\"application/ld+json\">{\"@type\":\"NewsArticle\",\"headline\":\"美國就業數據出爐 │ TVBS新聞網\",\"url\":\"https://news.tvbs.com.tw/world/2226104\",\"author\":[{\"@type\":\"Person\",\"name\":\"王小明\"},{\"@type\":\"Organization\",\"name\":\"TVBS\"}]}</script>
</head><body>
<div id=\"news_detail_div\">美國勞工部公布數據。<br>
失業率上升。\u{a0}
<div align=\"center\">廣告</div>
<div class=\"img\">圖片說明</div>
<div class=\"guangxuan\">贊助</div>
市場反應平淡。</div>
</body></html>";

    #[test]
    fn guid_keeps_later_slashes() {
        let u = Url::parse("https://news.tvbs.com.tw/world/2226104").unwrap();
        assert_eq!(Tvbs.to_guid(&u), "world-2226104");
    }

    #[test]
    fn extracts_page() {
        let url = Url::parse("https://news.tvbs.com.tw/world/2226104").unwrap();
        let out = extract(&Tvbs, PAGE, &url).unwrap();
        let n = out.news;
        assert!(out.issues.is_empty(), "{}", out.issues);
        assert_eq!(n.title, "美國就業數據出爐");
        assert_eq!(n.category, "國際");
        assert_eq!(n.author, vec!["王小明"]);
        assert_eq!(
            n.content,
            vec!["美國勞工部公布數據。", "失業率上升。", "市場反應平淡。"]
        );
    }
}
