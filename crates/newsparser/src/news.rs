// ABOUTME: The canonical news record and the deterministic merge of two extraction drafts.
// ABOUTME: First-non-empty-wins for scalars and whole lists, set union for tags and related GUIDs.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::text::truncate_chars;

/// A structured news article.
///
/// Drafts produced by the linked-data and meta extractors share this shape;
/// a missing value is the empty string, the empty list or `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct News {
    pub title: String,
    pub link: Option<Url>,
    pub description: String,
    pub language: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub author: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub category: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub guid: String,
    #[serde(rename = "pubDate", default, skip_serializing_if = "Option::is_none")]
    pub pub_date: Option<DateTime<Utc>>,
    pub content: Vec<String>,
    pub tag: Vec<String>,
    pub related_guid: Vec<String>,
}

fn first_non_empty(a: String, b: String) -> String {
    if a.is_empty() {
        b
    } else {
        a
    }
}

fn first_non_empty_list(a: Vec<String>, b: Vec<String>) -> Vec<String> {
    if a.is_empty() {
        b
    } else {
        a
    }
}

/// Sorted, de-duplicated union of two lists with empty entries removed.
fn union(a: Vec<String>, b: Vec<String>) -> Vec<String> {
    a.into_iter()
        .chain(b)
        .filter(|s| !s.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

impl News {
    /// Reconciles the linked-data draft `primary` with the meta draft `fallback`.
    ///
    /// Every scalar and each list of authors or paragraphs comes from
    /// `primary` when populated there and from `fallback` otherwise. Tags and
    /// related GUIDs are unioned and returned sorted.
    pub fn merge(primary: News, fallback: News) -> News {
        News {
            title: first_non_empty(primary.title, fallback.title),
            link: primary.link.or(fallback.link),
            description: first_non_empty(primary.description, fallback.description),
            language: first_non_empty(primary.language, fallback.language),
            author: first_non_empty_list(primary.author, fallback.author),
            category: first_non_empty(primary.category, fallback.category),
            guid: first_non_empty(primary.guid, fallback.guid),
            pub_date: primary.pub_date.or(fallback.pub_date),
            content: first_non_empty_list(primary.content, fallback.content),
            tag: union(primary.tag, fallback.tag),
            related_guid: union(primary.related_guid, fallback.related_guid),
        }
    }

    /// Adds tags, keeping the list sorted and unique.
    pub fn add_tags<I: IntoIterator<Item = String>>(&mut self, tags: I) {
        let existing = std::mem::take(&mut self.tag);
        self.tag = union(existing, tags.into_iter().collect());
    }

    /// Adds a related GUID unless it is empty or already present.
    pub fn add_related(&mut self, guid: String) {
        if !guid.is_empty() && !self.related_guid.contains(&guid) {
            self.related_guid.push(guid);
        }
    }

    /// Host of the canonical link, if any.
    pub fn source(&self) -> Option<&str> {
        self.link.as_ref().and_then(|u| u.host_str())
    }
}

impl fmt::Display for News {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Item:")?;
        writeln!(f, " - Title       : {}", self.title)?;
        writeln!(f, " - Author      : {}", self.author.join(", "))?;
        writeln!(
            f,
            " - Link        : {}",
            self.link.as_ref().map(Url::as_str).unwrap_or("")
        )?;
        match truncate_chars(&self.description, 50) {
            (head, 0) => writeln!(f, " - Description : {}", head)?,
            (head, rest) => writeln!(f, " - Description : {} (...{} words)", head, rest)?,
        }
        writeln!(f, " - Category    : {}", self.category)?;
        writeln!(f, " - GUID        : {}", self.guid)?;
        writeln!(f, " - Language    : {}", self.language)?;
        match self.pub_date {
            Some(d) => writeln!(f, " - PubDate     : {}", d.format("%Y-%m-%d %H:%M:%S"))?,
            None => writeln!(f, " - PubDate     : ")?,
        }
        writeln!(f, " - Tags        : {}", self.tag.join(", "))?;
        match truncate_chars(&self.content.concat(), 50) {
            (head, 0) => writeln!(f, " - Content     : {}", head)?,
            (head, rest) => writeln!(f, " - Content     : {} (...{} words)", head, rest)?,
        }
        writeln!(f, " - Related GUID: {}", self.related_guid.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn linked_data_draft() -> News {
        News {
            title: "核汙水排入海 中日緊張升溫".into(),
            link: Url::parse("https://www.cna.com.tw/news/ahel/202308230179.aspx").ok(),
            category: "國際".into(),
            guid: "ahel-202308230179".into(),
            pub_date: Some(Utc.with_ymd_and_hms(2023, 8, 23, 4, 1, 0).unwrap()),
            author: strings(&["張三"]),
            tag: strings(&["日本", "福島"]),
            ..Default::default()
        }
    }

    #[test]
    fn primary_fields_win() {
        let primary = linked_data_draft();
        let fallback = News {
            title: "other title".into(),
            link: Url::parse("https://example.com/x").ok(),
            description: "from meta".into(),
            category: "other".into(),
            author: strings(&["李四", "王五"]),
            content: strings(&["p1"]),
            tag: strings(&["福島", "核電"]),
            ..Default::default()
        };

        let merged = News::merge(primary.clone(), fallback);
        assert_eq!(merged.title, primary.title);
        assert_eq!(merged.link, primary.link);
        assert_eq!(merged.category, primary.category);
        assert_eq!(merged.guid, primary.guid);
        assert_eq!(merged.pub_date, primary.pub_date);
        assert_eq!(merged.author, primary.author);
        // Filled from the fallback because the primary left them empty.
        assert_eq!(merged.description, "from meta");
        assert_eq!(merged.content, strings(&["p1"]));
        assert_eq!(merged.tag, strings(&["日本", "核電", "福島"]));
    }

    #[test]
    fn description_fills_from_either_side() {
        let mut with_desc = linked_data_draft();
        with_desc.description = "linked data description".into();
        let merged = News::merge(with_desc, News::default());
        assert_eq!(merged.description, "linked data description");

        let meta = News {
            description: "meta description".into(),
            ..Default::default()
        };
        let merged = News::merge(linked_data_draft(), meta);
        assert_eq!(merged.description, "meta description");
    }

    #[test]
    fn merge_is_deterministic() {
        let a = News::merge(linked_data_draft(), News::default());
        let b = News::merge(linked_data_draft(), News::default());
        assert_eq!(a, b);
    }

    #[test]
    fn union_drops_empty_tags() {
        let mut news = News::default();
        news.add_tags(strings(&["b", "", "a", "b"]));
        assert_eq!(news.tag, strings(&["a", "b"]));
    }

    #[test]
    fn add_related_skips_duplicates() {
        let mut news = News::default();
        news.add_related("x".into());
        news.add_related("x".into());
        news.add_related(String::new());
        news.add_related("y".into());
        assert_eq!(news.related_guid, strings(&["x", "y"]));
    }

    #[test]
    fn display_truncates_long_text() {
        let mut news = linked_data_draft();
        news.description = "字".repeat(60);
        let out = news.to_string();
        assert!(out.contains("(...10 words)"));
        assert!(out.contains(" - GUID        : ahel-202308230179"));
    }

    #[test]
    fn json_carries_link_as_string() {
        let news = linked_data_draft();
        let value = serde_json::to_value(&news).unwrap();
        assert_eq!(
            value["link"],
            "https://www.cna.com.tw/news/ahel/202308230179.aspx"
        );
        assert_eq!(value["pubDate"], "2023-08-23T04:01:00Z");

        let back: News = serde_json::from_value(value).unwrap();
        assert_eq!(back, news);
    }
}
