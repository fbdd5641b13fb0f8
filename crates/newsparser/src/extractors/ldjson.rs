// ABOUTME: Linked-data (schema.org JSON-LD) framework: tolerant block finder and typed decoding.
// ABOUTME: Handles fields that arrive as one object or an array, and keyword lists as strings or arrays.

//! Structured-data extraction.
//!
//! News pages embed one or more JSON-LD objects inside
//! `<script type="application/ld+json">`, frequently several back-to-back or
//! nested in a single tag. [`find_target`] performs a shallow brace-depth
//! scan to isolate the first object whose `"@type"` mentions the wanted type,
//! then [`extract_into`] decodes it into a [`LinkedData`] record and fills a
//! draft [`News`].

use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer, SeqAccess, Visitor};
use serde::Deserialize;
use url::Url;

use crate::error::ParseError;
use crate::extractors::SiteExtractor;
use crate::news::News;
use crate::text::parse_csl;

/// The schema.org type looked up when none is configured.
pub const DEFAULT_TARGET_TYPE: &str = "NewsArticle";

/// Finds the first top-level `{...}` block whose `"@type"` mentions `target`.
///
/// This is a brace counter, not a JSON tokenizer: braces inside strings are
/// counted too, and an unbalanced trailing block is ignored.
pub fn find_target<'a>(data: &'a str, target: &str) -> Option<&'a str> {
    let bytes = data.as_bytes();
    let mut start = 0;
    while start < bytes.len() {
        if bytes[start] != b'{' {
            start += 1;
            continue;
        }
        let mut depth = 1usize;
        let mut end = start + 1;
        while end < bytes.len() {
            match bytes[end] {
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
            end += 1;
        }
        if end >= bytes.len() {
            return None;
        }
        let block = &data[start..=end];
        if is_target_type(block, target) {
            return Some(block);
        }
        start = end + 1;
    }
    None
}

/// Returns true if any `"@type"` entry of `data`, read up to the next comma, contains `target`.
pub fn is_target_type(data: &str, target: &str) -> bool {
    data.match_indices("@type").any(|(i, _)| {
        let rest = &data[i..];
        let field = match rest.find(',') {
            Some(comma) => &rest[..comma],
            None => rest,
        };
        field.contains(target)
    })
}

/// A schema.org object reference such as an author, publisher or topic.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LinkedObject {
    #[serde(rename = "@id", default)]
    pub id: String,
    #[serde(rename = "@type", default, deserialize_with = "one_string")]
    pub kind: String,
    #[serde(default, deserialize_with = "one_string")]
    pub name: String,
    #[serde(rename = "alternateName", default, deserialize_with = "one_string")]
    pub alt_name: String,
    #[serde(rename = "sameAs", default)]
    pub same_as: OneOrMany<String>,
}

/// Zero or more values decoded from either a single value or an array.
#[derive(Debug, Clone, PartialEq)]
pub struct OneOrMany<T>(pub Vec<T>);

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        OneOrMany(Vec::new())
    }
}

impl<T> OneOrMany<T> {
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.0.iter()
    }

    pub fn first(&self) -> Option<&T> {
        self.0.first()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for OneOrMany<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr<T> {
            Many(Vec<T>),
            One(T),
            Null(()),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Many(items) => OneOrMany(items),
            Repr::One(item) => OneOrMany(vec![item]),
            Repr::Null(()) => OneOrMany(Vec::new()),
        })
    }
}

/// A keyword list, published either as `"a, b, c"` or as `["a", "b", "c"]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Csl(pub Vec<String>);

impl<'de> Deserialize<'de> for Csl {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CslVisitor;

        impl<'de> Visitor<'de> for CslVisitor {
            type Value = Csl;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a comma separated string or an array of strings")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Csl, E> {
                Ok(Csl(parse_csl(v)))
            }

            fn visit_unit<E: de::Error>(self) -> Result<Csl, E> {
                Ok(Csl::default())
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Csl, A::Error> {
                let mut items = Vec::new();
                while let Some(item) = seq.next_element::<String>()? {
                    items.extend(parse_csl(&item));
                }
                Ok(Csl(items))
            }
        }

        deserializer.deserialize_any(CslVisitor)
    }
}

/// Accepts a string, the first string of an array, or null.
fn one_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let values = OneOrMany::<Option<String>>::deserialize(deserializer)?;
    Ok(values.0.into_iter().flatten().next().unwrap_or_default())
}

/// The subset of a schema.org `NewsArticle` used to build a draft.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct LinkedData {
    #[serde(rename = "@type", deserialize_with = "one_string")]
    pub kind: String,
    #[serde(deserialize_with = "one_string")]
    pub headline: String,
    #[serde(deserialize_with = "one_string")]
    pub description: String,
    #[serde(deserialize_with = "one_string")]
    pub url: String,
    #[serde(rename = "articleSection", deserialize_with = "one_string")]
    pub article_section: String,
    pub author: OneOrMany<LinkedObject>,
    pub about: OneOrMany<LinkedObject>,
    pub keywords: Csl,
    #[serde(rename = "datePublished", deserialize_with = "one_string")]
    pub date_published: String,
    #[serde(rename = "dateModified", deserialize_with = "one_string")]
    pub date_modified: String,
}

impl LinkedData {
    /// The article URL, if present and absolute.
    pub fn link(&self) -> Option<Url> {
        Url::parse(self.url.trim()).ok()
    }

    /// Publish time normalized to UTC.
    pub fn published(&self) -> Option<DateTime<Utc>> {
        parse_rfc3339(&self.date_published)
    }

    /// Modification time normalized to UTC.
    pub fn modified(&self) -> Option<DateTime<Utc>> {
        parse_rfc3339(&self.date_modified)
    }

    /// Names of the listed authors, in order.
    pub fn author_names(&self) -> Vec<String> {
        self.author
            .iter()
            .map(|a| a.name.trim().to_string())
            .filter(|n| !n.is_empty())
            .collect()
    }
}

/// Parses an RFC3339 timestamp into UTC; anything else yields `None`.
pub fn parse_rfc3339(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s.trim())
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

/// Decodes a (possibly preprocessed) linked-data block.
///
/// The block goes through `serde_json::Value` first so that a key repeated
/// by a rewrite keeps its last value instead of failing the decode.
pub fn decode(block: &str, page_url: &str) -> Result<LinkedData, ParseError> {
    let invalid = |e: serde_json::Error| {
        ParseError::linked_data_decode(
            page_url,
            "ParseJsonLD",
            Some(anyhow::anyhow!("invalid json object: {}", e)),
        )
    };
    let value: serde_json::Value = serde_json::from_str(block).map_err(invalid)?;
    LinkedData::deserialize(value).map_err(invalid)
}

/// Runs the linked-data framework for `site` over the given script bodies.
///
/// The first script containing a block of the site's target type wins. The
/// draft receives headline, section, description, URL, publish date and
/// keywords, then the site's post-assignment hook runs.
pub fn extract_into<S: SiteExtractor + ?Sized>(
    site: &S,
    draft: &mut News,
    scripts: &[String],
    page_url: &str,
) -> Result<(), ParseError> {
    let target = site.linked_data_type();
    let Some(block) = scripts.iter().find_map(|s| find_target(s, target)) else {
        return Err(ParseError::linked_data_not_found(page_url, "ParseJsonLD"));
    };

    let prepared = site.preprocess_linked_data(block);
    let data = decode(&prepared, page_url)?;

    draft.title = data.headline.trim().to_string();
    draft.category = data.article_section.trim().to_string();
    draft.description = data.description.trim().to_string();
    draft.link = data.link();
    draft.pub_date = data.published();
    draft.tag = data.keywords.0.clone();
    if let Some(link) = &draft.link {
        draft.guid = site.to_guid(link);
    }

    site.after_linked_data(draft, &data);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    const BACK_TO_BACK: &str = r#"
        {"@context":"https://schema.org","@type":"BreadcrumbList","itemListElement":[{"@type":"ListItem","position":1}]}
        {"@context":"https://schema.org","@type":"NewsArticle","headline":"核汙水排入海 中日緊張升溫","author":{"@type":"Person","name":"張三"}}
    "#;

    #[test]
    fn finds_second_of_back_to_back_objects() {
        let block = find_target(BACK_TO_BACK, "NewsArticle").unwrap();
        assert!(block.starts_with('{'));
        assert!(block.ends_with('}'));
        assert!(block.contains("核汙水排入海"));
        assert!(!block.contains("BreadcrumbList"));
    }

    #[test]
    fn nested_type_marks_the_outer_object() {
        let data = r#"{"@context":"x","@graph":[{"@type":"NewsArticle","headline":"h"}]}"#;
        assert_eq!(find_target(data, "NewsArticle"), Some(data));
    }

    #[test]
    fn missing_or_unbalanced_is_not_found() {
        assert_eq!(find_target(r#"{"@type":"WebPage"}"#, "NewsArticle"), None);
        assert_eq!(find_target(r#"{"@type":"NewsArticle""#, "NewsArticle"), None);
        assert_eq!(find_target("", "NewsArticle"), None);
    }

    #[test]
    fn type_check_stops_at_comma() {
        assert!(is_target_type(r#"{"@type": "NewsArticle", "x": 1}"#, "NewsArticle"));
        assert!(is_target_type(r#"{"@type":["NewsArticle"]}"#, "NewsArticle"));
        assert!(!is_target_type(r#"{"@type":"WebPage","about":"NewsArticle"}"#, "NewsArticle"));
    }

    #[test]
    fn author_accepts_object_or_array() {
        let one: LinkedData =
            serde_json::from_str(r#"{"author":{"@type":"Person","name":"A"}}"#).unwrap();
        assert_eq!(one.author_names(), vec!["A"]);

        let many: LinkedData = serde_json::from_str(
            r#"{"author":[{"@type":"Person","name":"A"},{"@type":"Organization","name":"B"}]}"#,
        )
        .unwrap();
        assert_eq!(many.author_names(), vec!["A", "B"]);
        assert_eq!(many.author.0[1].kind, "Organization");

        let none: LinkedData = serde_json::from_str(r#"{"author":null}"#).unwrap();
        assert!(none.author.is_empty());
    }

    #[test]
    fn keywords_accept_string_or_array() {
        let s: LinkedData = serde_json::from_str(r#"{"keywords":"日本, 福島,,核電"}"#).unwrap();
        assert_eq!(s.keywords, Csl(vec!["日本".into(), "福島".into(), "核電".into()]));

        let a: LinkedData = serde_json::from_str(r#"{"keywords":["日本"," 福島 ",""]}"#).unwrap();
        assert_eq!(a.keywords, Csl(vec!["日本".into(), "福島".into()]));
    }

    #[test]
    fn dates_normalize_to_utc() {
        let d: LinkedData = serde_json::from_str(
            r#"{"datePublished":"2023-08-23T12:01:00+08:00","dateModified":"not a date"}"#,
        )
        .unwrap();
        assert_eq!(
            d.published(),
            Some(Utc.with_ymd_and_hms(2023, 8, 23, 4, 1, 0).unwrap())
        );
        assert_eq!(d.modified(), None);
    }

    #[test]
    fn invalid_json_is_a_decode_error() {
        let err = decode(r#"{"@type":"NewsArticle","headline":}"#, "https://x/").unwrap_err();
        assert!(err.is_linked_data_decode());
    }
}
