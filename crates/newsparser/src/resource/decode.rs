// ABOUTME: Content-Encoding handlers and charset decoding for fetched response bodies.
// ABOUTME: Decoders are named, cloneable byte transforms selected per response by the retriever.

use std::fmt;
use std::io::{self, Read};
use std::sync::Arc;

use flate2::read::GzDecoder;

type DecodeFn = dyn Fn(&[u8]) -> io::Result<Vec<u8>> + Send + Sync;

/// A named byte transform registered for one `Content-Encoding` tag.
#[derive(Clone)]
pub struct ContentDecoder {
    name: String,
    f: Arc<DecodeFn>,
}

impl ContentDecoder {
    pub fn new<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&[u8]) -> io::Result<Vec<u8>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            f: Arc::new(f),
        }
    }

    /// Pass-through used when a response names no registered encoding.
    pub fn identity() -> Self {
        Self::new("identity", |b| Ok(b.to_vec()))
    }

    pub fn gzip() -> Self {
        Self::new("gzip", |b| {
            let mut out = Vec::new();
            GzDecoder::new(b).read_to_end(&mut out)?;
            Ok(out)
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn decode(&self, body: &[u8]) -> io::Result<Vec<u8>> {
        (self.f)(body)
    }
}

impl fmt::Debug for ContentDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentDecoder")
            .field("name", &self.name)
            .finish()
    }
}

/// Decode body bytes to a String using charset from content-type header or detection.
pub fn decode_body(body: &[u8], content_type: Option<&str>) -> String {
    if let Some(ct) = content_type {
        if let Some(charset) = extract_charset(ct) {
            if let Some(encoding) = encoding_rs::Encoding::for_label(charset.as_bytes()) {
                let (decoded, _, _) = encoding.decode(body);
                return decoded.into_owned();
            }
        }
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(body, true);
    let encoding = detector.guess(None, true);
    let (decoded, _, _) = encoding.decode(body);
    decoded.into_owned()
}

/// Extract charset value from Content-Type header.
pub fn extract_charset(content_type: &str) -> Option<String> {
    let lower = content_type.to_lowercase();
    for part in lower.split(';') {
        if let Some(charset) = part.trim().strip_prefix("charset=") {
            let charset = charset.trim_matches('"').trim_matches('\'');
            return Some(charset.to_string());
        }
    }
    None
}
