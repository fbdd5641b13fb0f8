// ABOUTME: Extraction outcome types and the storage-creation projection of a news record.
// ABOUTME: The content hash is a near-duplicate-tolerant MD5 fingerprint of title, link, content and date.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};

use crate::error::{ErrorSet, ParseError};
use crate::news::News;
use crate::text::fingerprint;

/// Convenience alias for results using [`ParseError`].
pub type Result<T> = std::result::Result<T, ParseError>;

/// A record produced by one extraction pass plus its non-fatal issues.
///
/// `issues` holds malformed related links, a linked-data block that failed to
/// decode, a bad canonical link and similar failures that did not prevent a
/// usable record.
#[derive(Debug, Default)]
pub struct Extraction {
    pub news: News,
    pub issues: ErrorSet,
}

impl Extraction {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Storage-creation request for a merged record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsCreateRequest {
    pub md5_hash: String,
    pub guid: String,
    pub author: Vec<String>,
    pub title: String,
    pub link: String,
    pub description: String,
    pub language: String,
    pub content: Vec<String>,
    pub category: String,
    pub source: String,
    pub related_guid: Vec<String>,
    pub published_at: Option<DateTime<Utc>>,
}

/// Base64 MD5 over the alphanumeric title, the link, the alphanumeric content and the UTC day.
pub fn content_hash(news: &News) -> String {
    let mut key = fingerprint(&news.title);
    if let Some(link) = &news.link {
        key.push_str(link.as_str());
    }
    key.push_str(&fingerprint(&news.content.concat()));
    key.push('@');
    if let Some(d) = news.pub_date {
        key.push_str(&d.format("%Y-%m-%d").to_string());
    }
    STANDARD.encode(Md5::digest(key.as_bytes()))
}

impl News {
    /// Projects the record into a storage-creation request.
    pub fn to_create_request(&self) -> NewsCreateRequest {
        NewsCreateRequest {
            md5_hash: content_hash(self),
            guid: self.guid.clone(),
            author: self.author.clone(),
            title: self.title.clone(),
            link: self.link.as_ref().map(|u| u.to_string()).unwrap_or_default(),
            description: self.description.clone(),
            language: self.language.clone(),
            content: self.content.clone(),
            category: self.category.clone(),
            source: self.source().unwrap_or_default().to_string(),
            related_guid: self.related_guid.clone(),
            published_at: self.pub_date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use url::Url;

    fn sample() -> News {
        News {
            title: "核汙水排入海 中日緊張升溫".to_string(),
            link: Url::parse("https://www.cna.com.tw/news/ahel/202308230179.aspx").ok(),
            guid: "ahel-202308230179".to_string(),
            pub_date: Utc.with_ymd_and_hms(2023, 8, 23, 4, 1, 0).single(),
            content: vec!["第一段。".to_string(), "第二段！".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn hash_ignores_punctuation_and_whitespace() {
        let a = sample();
        let mut b = sample();
        b.title = "核汙水排入海，中日緊張升溫！".to_string();
        b.content = vec!["第一段".to_string(), " 第二段".to_string()];
        assert_eq!(content_hash(&a), content_hash(&b));
    }

    #[test]
    fn hash_depends_on_day_and_link() {
        let a = sample();
        let mut later = sample();
        later.pub_date = Utc.with_ymd_and_hms(2023, 8, 24, 4, 1, 0).single();
        assert_ne!(content_hash(&a), content_hash(&later));

        let mut moved = sample();
        moved.link = Url::parse("https://www.cna.com.tw/news/ahel/202308230180.aspx").ok();
        assert_ne!(content_hash(&a), content_hash(&moved));
    }

    #[test]
    fn hash_is_base64_md5() {
        let hash = content_hash(&News::default());
        // md5("@") is 16 bytes, 24 chars once base64 encoded.
        assert_eq!(hash.len(), 24);
        assert_eq!(hash, STANDARD.encode(Md5::digest(b"@")));
    }

    #[test]
    fn projects_create_request() {
        let req = sample().to_create_request();
        assert_eq!(req.source, "www.cna.com.tw");
        assert_eq!(req.guid, "ahel-202308230179");
        assert_eq!(req.link, "https://www.cna.com.tw/news/ahel/202308230179.aspx");
        assert_eq!(req.md5_hash, content_hash(&sample()));
        assert_eq!(req.content.len(), 2);
    }
}
