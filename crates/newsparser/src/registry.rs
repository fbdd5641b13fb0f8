// ABOUTME: Domain registry mapping URL hosts to site extractors, built once and shared read-only.
// ABOUTME: Dispatches pages to the matching extractor and derives GUIDs with a lenient path fallback.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::error::ParseError;
use crate::extractors::process;
use crate::extractors::SiteExtractor;
use crate::resource::Query;
use crate::result::Extraction;
use crate::sites;

/// Host to extractor table.
///
/// Build it at startup, then share it behind an `Arc`; nothing mutates it
/// afterwards.
#[derive(Clone, Default)]
pub struct Registry {
    map: HashMap<String, Arc<dyn SiteExtractor>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in site extractor.
    pub fn with_builtin_sites() -> Self {
        let mut reg = Self::new();
        for site in sites::builtin() {
            reg.register(site);
        }
        info!(domains = reg.len(), "registry populated");
        reg
    }

    /// Claims every domain of `site`. A domain claimed earlier is overwritten.
    pub fn register(&mut self, site: Arc<dyn SiteExtractor>) {
        for domain in site.domains() {
            let key = domain.to_ascii_lowercase();
            if let Some(prev) = self.map.insert(key, Arc::clone(&site)) {
                warn!(
                    domain = %domain,
                    previous = prev.name(),
                    current = site.name(),
                    "domain registered twice, keeping the latest"
                );
            }
        }
        debug!(site = site.name(), domains = ?site.domains(), "site registered");
    }

    /// Like [`register`](Self::register) but refuses to overwrite.
    ///
    /// Nothing is registered when any domain of `site` is already claimed.
    pub fn try_register(&mut self, site: Arc<dyn SiteExtractor>) -> Result<(), ParseError> {
        for domain in site.domains() {
            if let Some(existing) = self.map.get(&domain.to_ascii_lowercase()) {
                return Err(ParseError::conflict(domain, existing.name(), site.name()));
            }
        }
        self.register(site);
        Ok(())
    }

    pub fn get(&self, host: &str) -> Option<&Arc<dyn SiteExtractor>> {
        self.map.get(&host.to_ascii_lowercase())
    }

    pub fn supports_domain(&self, host: &str) -> bool {
        self.get(host).is_some()
    }

    /// Supported domains, sorted.
    pub fn domains(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self.map.keys().map(String::as_str).collect();
        out.sort_unstable();
        out
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// GUID for `url` from its site's rule, or the URL path for unknown hosts.
    ///
    /// Only meant for identity lookups; extraction never falls back like this.
    pub fn derive_guid(&self, url: &Url) -> String {
        match url.host_str().and_then(|h| self.get(h)) {
            Some(site) => site.to_guid(url),
            None => url.path().to_string(),
        }
    }

    fn lookup(&self, url: &Url) -> Result<&Arc<dyn SiteExtractor>, ParseError> {
        let host = url.host_str().unwrap_or_default();
        self.get(host)
            .ok_or_else(|| ParseError::parser_not_found(url.as_str(), host))
    }

    /// Runs the extractor registered for `url`'s host over `html`.
    #[instrument(level = "debug", skip(self, html), fields(url = %url))]
    pub fn dispatch(&self, url: &Url, html: &str) -> Result<Extraction, ParseError> {
        let site = self.lookup(url)?;
        debug!(site = site.name(), "dispatching");
        let extraction = process::extract(site.as_ref(), html, url)?;
        if !extraction.issues.is_empty() {
            warn!(site = site.name(), issues = extraction.issues.len(), "extracted with issues");
        }
        Ok(extraction)
    }

    /// Reads a fetched query's body and attaches the extracted record.
    ///
    /// The host is checked before the body is read, so unsupported pages
    /// never reach an extractor.
    #[instrument(level = "debug", skip(self, query), fields(id = query.id()))]
    pub async fn extract_query(&self, query: &mut Query) -> Result<(), ParseError> {
        let Some(url) = query.url().cloned() else {
            return Err(ParseError::invalid_url(
                query.raw_url(),
                "Extract",
                Some(anyhow::anyhow!("url not parsed")),
            ));
        };
        self.lookup(&url)?;

        let html = query.content().await?;
        let extraction = self.dispatch(&url, &html)?;
        query.issues.extend(extraction.issues);
        query.news = Some(extraction.news);
        Ok(())
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("domains", &self.domains())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorSet;
    use crate::extractors::meta::Meta;
    use crate::news::News;
    use pretty_assertions::assert_eq;
    use scraper::ElementRef;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Stub {
        name: &'static str,
        domains: &'static [&'static str],
        calls: AtomicUsize,
    }

    impl Stub {
        fn new(name: &'static str, domains: &'static [&'static str]) -> Arc<Self> {
            Arc::new(Self {
                name,
                domains,
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl SiteExtractor for Stub {
        fn name(&self) -> &'static str {
            self.name
        }

        fn domains(&self) -> &'static [&'static str] {
            self.domains
        }

        fn to_guid(&self, url: &Url) -> String {
            format!("{}:{}", self.name, url.path())
        }

        fn after_meta(&self, draft: &mut News, meta: &Meta, _page_url: &str) -> Result<(), ParseError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            draft.title = meta.title.clone();
            Ok(())
        }

        fn extract_body(&self, _news: &mut News, _body: ElementRef<'_>) -> ErrorSet {
            ErrorSet::new()
        }
    }

    #[test]
    fn later_registration_wins() {
        let mut reg = Registry::new();
        reg.register(Stub::new("first", &["a.example", "b.example"]));
        reg.register(Stub::new("second", &["b.example"]));
        assert_eq!(reg.get("a.example").unwrap().name(), "first");
        assert_eq!(reg.get("B.example").unwrap().name(), "second");
        assert_eq!(reg.domains(), vec!["a.example", "b.example"]);
    }

    #[test]
    fn strict_registration_reports_conflict() {
        let mut reg = Registry::new();
        reg.try_register(Stub::new("first", &["a.example"])).unwrap();
        let err = reg
            .try_register(Stub::new("second", &["c.example", "a.example"]))
            .unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(reg.get("a.example").unwrap().name(), "first");
        assert!(!reg.supports_domain("c.example"));
    }

    #[test]
    fn unknown_host_never_reaches_an_extractor() {
        let stub = Stub::new("only", &["a.example"]);
        let mut reg = Registry::new();
        reg.register(stub.clone());

        let url = Url::parse("https://unknown.example/x").unwrap();
        let err = reg.dispatch(&url, "<html><head><title>t</title></head></html>").unwrap_err();
        assert!(err.is_parser_not_found());
        assert!(err.to_string().contains("unknown.example"));
        assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn dispatch_runs_matching_extractor() {
        let stub = Stub::new("only", &["a.example"]);
        let mut reg = Registry::new();
        reg.register(stub.clone());

        let url = Url::parse("https://a.example/story/1").unwrap();
        let out = reg
            .dispatch(&url, "<html lang=\"en\"><head><title>Hello</title></head><body></body></html>")
            .unwrap();
        assert_eq!(stub.calls.load(Ordering::SeqCst), 1);
        assert_eq!(out.news.title, "Hello");
        assert_eq!(out.news.language, "en");
        assert_eq!(out.news.guid, "only:/story/1");
    }

    #[test]
    fn guid_falls_back_to_path() {
        let mut reg = Registry::new();
        reg.register(Stub::new("only", &["a.example"]));
        let known = Url::parse("https://a.example/p/q").unwrap();
        let unknown = Url::parse("https://z.example/p/q").unwrap();
        assert_eq!(reg.derive_guid(&known), "only:/p/q");
        assert_eq!(reg.derive_guid(&known), reg.derive_guid(&known));
        assert_eq!(reg.derive_guid(&unknown), "/p/q");
    }

    #[test]
    fn builtin_sites_cover_catalogue() {
        let reg = Registry::with_builtin_sites();
        for host in [
            "www.cna.com.tw",
            "www.chinatimes.com",
            "www.ettoday.net",
            "news.ltn.com.tw",
            "sports.ltn.com.tw",
            "udn.com",
            "global.udn.com",
            "www.bbc.com",
            "www.bbc.co.uk",
            "cn.nytimes.com",
            "news.pts.org.tw",
            "www.rfi.fr",
            "www.setn.com",
            "news.tvbs.com.tw",
            "www.upmedia.mg",
        ] {
            assert!(reg.supports_domain(host), "{host}");
        }
        assert_eq!(reg.len(), 15);
    }
}
