// ABOUTME: Pre-compiled CSS selector cache shared by every site extractor.
// ABOUTME: Selector strings are parsed once and reused across documents and threads.

//! Selector caching for repeated DOM queries.
//!
//! Site extractors describe their targets as selector strings, and the same
//! strings are evaluated for every article of that site. This module parses
//! each string once into a [`scraper::Selector`] and hands out clones.

use std::collections::HashMap;
use std::sync::RwLock;

use once_cell::sync::Lazy;
use scraper::Selector;

/// Thread-safe cache of compiled selectors; invalid selectors are cached as `None`.
static SELECTOR_CACHE: Lazy<RwLock<HashMap<String, Option<Selector>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Gets or compiles a CSS selector, caching the result.
///
/// Returns `None` for selectors that fail to parse. A poisoned lock is
/// recovered since the cache only ever holds fully built entries.
pub fn get_or_compile(css: &str) -> Option<Selector> {
    {
        let cache = SELECTOR_CACHE.read().unwrap_or_else(|e| e.into_inner());
        if let Some(cached) = cache.get(css) {
            return cached.clone();
        }
    }

    let compiled = Selector::parse(css).ok();
    if compiled.is_none() {
        tracing::warn!(selector = css, "invalid CSS selector");
    }
    let mut cache = SELECTOR_CACHE.write().unwrap_or_else(|e| e.into_inner());
    // Another thread may have inserted while we were parsing.
    if let Some(cached) = cache.get(css) {
        return cached.clone();
    }
    cache.insert(css.to_string(), compiled.clone());
    compiled
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_selector_is_cached() {
        assert!(get_or_compile("div.centralContent div.paragraph p").is_some());
        assert!(get_or_compile("div.centralContent div.paragraph p").is_some());
    }

    #[test]
    fn invalid_selector_returns_none() {
        assert!(get_or_compile("[[[invalid").is_none());
        assert!(get_or_compile("[[[invalid").is_none());
    }
}
