// ABOUTME: Error types for the news parser including ErrorCode, ParseError, ErrorSet and PipelineError.
// ABOUTME: Provides categorized errors with convenience constructors, boolean helpers and keyed aggregation.

use std::collections::BTreeMap;
use std::fmt;

/// Error codes representing the categories of fetch and extraction failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    InvalidUrl,
    Transport,
    Timeout,
    Status,
    Decode,
    NoHandler,
    LinkedDataNotFound,
    LinkedDataDecode,
    ParserNotFound,
    RelatedLink,
    Extract,
    Config,
    Conflict,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::InvalidUrl => "invalid URL",
            ErrorCode::Transport => "transport error",
            ErrorCode::Timeout => "timeout",
            ErrorCode::Status => "HTTP status error",
            ErrorCode::Decode => "decode error",
            ErrorCode::NoHandler => "handler is nil",
            ErrorCode::LinkedDataNotFound => "target jsonld not found",
            ErrorCode::LinkedDataDecode => "invalid json object",
            ErrorCode::ParserNotFound => "could not find parser for given domain",
            ErrorCode::RelatedLink => "related link error",
            ErrorCode::Extract => "extraction error",
            ErrorCode::Config => "configuration error",
            ErrorCode::Conflict => "domain conflict",
        };
        write!(f, "{}", s)
    }
}

/// The main error type for fetch and extraction operations.
#[derive(Debug, thiserror::Error)]
pub struct ParseError {
    pub code: ErrorCode,
    pub url: String,
    pub op: String,
    /// HTTP status code, set for `ErrorCode::Status`.
    pub status: Option<u16>,
    #[source]
    pub source: Option<anyhow::Error>,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "newsparser: {} {}: {}", self.op, self.url, self.code)?;
        if let Some(status) = self.status {
            write!(f, ": request error with error code {}", status)?;
        }
        if let Some(ref src) = self.source {
            write!(f, ": {}", src)?;
        }
        Ok(())
    }
}

impl ParseError {
    /// Create an error with an arbitrary code.
    pub fn new(
        code: ErrorCode,
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self {
            code,
            url: url.into(),
            op: op.into(),
            status: None,
            source,
        }
    }

    /// Create an InvalidUrl error.
    pub fn invalid_url(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::new(ErrorCode::InvalidUrl, url, op, source)
    }

    /// Create a Transport error.
    pub fn transport(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::new(ErrorCode::Transport, url, op, source)
    }

    /// Create a Timeout error.
    pub fn timeout(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::new(ErrorCode::Timeout, url, op, source)
    }

    /// Create a Status error carrying the response status code.
    pub fn status(url: impl Into<String>, op: impl Into<String>, status: u16) -> Self {
        Self {
            status: Some(status),
            ..Self::new(ErrorCode::Status, url, op, None)
        }
    }

    /// Create a Decode error.
    pub fn decode(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::new(ErrorCode::Decode, url, op, source)
    }

    /// Create a NoHandler error.
    pub fn no_handler(url: impl Into<String>, op: impl Into<String>) -> Self {
        Self::new(ErrorCode::NoHandler, url, op, None)
    }

    /// Create a LinkedDataNotFound error.
    pub fn linked_data_not_found(url: impl Into<String>, op: impl Into<String>) -> Self {
        Self::new(ErrorCode::LinkedDataNotFound, url, op, None)
    }

    /// Create a LinkedDataDecode error.
    pub fn linked_data_decode(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::new(ErrorCode::LinkedDataDecode, url, op, source)
    }

    /// Create a ParserNotFound error for the given host.
    pub fn parser_not_found(url: impl Into<String>, host: &str) -> Self {
        Self::new(
            ErrorCode::ParserNotFound,
            url,
            "Dispatch",
            Some(anyhow::anyhow!("{}", host)),
        )
    }

    /// Create a RelatedLink error.
    pub fn related_link(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::new(ErrorCode::RelatedLink, url, op, source)
    }

    /// Create an Extract error.
    pub fn extract(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::new(ErrorCode::Extract, url, op, source)
    }

    /// Create a Config error.
    pub fn config(op: impl Into<String>, source: Option<anyhow::Error>) -> Self {
        Self::new(ErrorCode::Config, String::new(), op, source)
    }

    /// Create a Conflict error for a domain claimed twice.
    pub fn conflict(domain: &str, existing: &str, incoming: &str) -> Self {
        Self::new(
            ErrorCode::Conflict,
            domain,
            "Register",
            Some(anyhow::anyhow!(
                "{} is already claimed by {}, refusing {}",
                domain,
                existing,
                incoming
            )),
        )
    }

    /// Returns true if this is an InvalidUrl error.
    pub fn is_invalid_url(&self) -> bool {
        self.code == ErrorCode::InvalidUrl
    }

    /// Returns true if this is a Transport error.
    pub fn is_transport(&self) -> bool {
        self.code == ErrorCode::Transport
    }

    /// Returns true if this is a Timeout error.
    pub fn is_timeout(&self) -> bool {
        self.code == ErrorCode::Timeout
    }

    /// Returns true if this is a Status error.
    pub fn is_status(&self) -> bool {
        self.code == ErrorCode::Status
    }

    /// Returns true if this is a Decode error.
    pub fn is_decode(&self) -> bool {
        self.code == ErrorCode::Decode
    }

    /// Returns true if this is a NoHandler error.
    pub fn is_no_handler(&self) -> bool {
        self.code == ErrorCode::NoHandler
    }

    /// Returns true if no linked-data block of the target type was found.
    pub fn is_linked_data_not_found(&self) -> bool {
        self.code == ErrorCode::LinkedDataNotFound
    }

    /// Returns true if a linked-data block was found but could not be decoded.
    pub fn is_linked_data_decode(&self) -> bool {
        self.code == ErrorCode::LinkedDataDecode
    }

    /// Returns true if this is a ParserNotFound error.
    pub fn is_parser_not_found(&self) -> bool {
        self.code == ErrorCode::ParserNotFound
    }

    /// Returns true if this is a RelatedLink error.
    pub fn is_related_link(&self) -> bool {
        self.code == ErrorCode::RelatedLink
    }

    /// Returns true if this is a Config error.
    pub fn is_config(&self) -> bool {
        self.code == ErrorCode::Config
    }

    /// Returns true if this is a Conflict error.
    pub fn is_conflict(&self) -> bool {
        self.code == ErrorCode::Conflict
    }
}

/// A keyed collection of independent failures from a single extraction pass.
///
/// Keys are usually the offending input (a related-link href, a field name),
/// so adding the same key twice keeps only the latest error.
#[derive(Debug, Default)]
pub struct ErrorSet {
    errors: BTreeMap<String, ParseError>,
}

impl ErrorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error under `key`.
    pub fn add(&mut self, key: impl Into<String>, err: ParseError) {
        self.errors.insert(key.into(), err);
    }

    /// Move every entry of `other` into this set.
    pub fn extend(&mut self, other: ErrorSet) {
        self.errors.extend(other.errors);
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns true if any recorded error carries `code`.
    pub fn has_code(&self, code: ErrorCode) -> bool {
        self.errors.values().any(|e| e.code == code)
    }

    pub fn get(&self, key: &str) -> Option<&ParseError> {
        self.errors.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParseError)> {
        self.errors.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl fmt::Display for ErrorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "multiple errors:")?;
        for (key, err) in &self.errors {
            writeln!(f, "{:<10}: {}", key, err)?;
        }
        Ok(())
    }
}

impl std::error::Error for ErrorSet {}

/// A per-item failure reported on the pipeline's error stream.
#[derive(Debug, thiserror::Error)]
#[error("{id}-th query: stage {stage} ({stage_name}): {source}")]
pub struct PipelineError {
    pub id: u64,
    pub stage: usize,
    pub stage_name: &'static str,
    #[source]
    pub source: ParseError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_mentions_code() {
        let err = ParseError::status("https://example.com/a", "CheckStatus", 404);
        assert!(err.is_status());
        assert_eq!(err.status, Some(404));
        let msg = err.to_string();
        assert!(msg.contains("404"), "unexpected message: {}", msg);
        assert!(msg.contains("CheckStatus"));
    }

    #[test]
    fn parser_not_found_carries_host() {
        let err = ParseError::parser_not_found("https://nowhere.test/x", "nowhere.test");
        assert!(err.is_parser_not_found());
        assert!(err.to_string().ends_with("nowhere.test"));
    }

    #[test]
    fn error_set_keeps_latest_per_key() {
        let mut set = ErrorSet::new();
        assert!(set.is_empty());
        set.add("a", ParseError::extract("", "First", None));
        set.add("a", ParseError::related_link("", "Second", None));
        set.add("b", ParseError::decode("", "Third", None));
        assert_eq!(set.len(), 2);
        assert_eq!(set.get("a").map(|e| e.code), Some(ErrorCode::RelatedLink));
        assert!(set.has_code(ErrorCode::Decode));
        assert!(!set.has_code(ErrorCode::Extract));
        assert!(set.to_string().starts_with("multiple errors:\n"));
    }

    #[test]
    fn pipeline_error_format() {
        let err = PipelineError {
            id: 3,
            stage: 2,
            stage_name: "check-status",
            source: ParseError::status("http://x/notfound", "CheckStatus", 404),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("3-th query: stage 2 (check-status): "));
        assert!(msg.contains("404"));
    }
}
