// ABOUTME: Built-in site extractors, one module per supported news site.
// ABOUTME: Also holds the small URL helpers several GUID rules share.

use std::sync::Arc;

use url::Url;

use crate::extractors::SiteExtractor;

pub mod bbc;
pub mod cna;
pub mod ct;
pub mod ettoday;
pub mod ltn;
pub mod nytimes;
pub mod pts;
pub mod rfi;
pub mod setn;
pub mod tvbs;
pub mod udn;
pub mod up;

/// Every built-in extractor, in registration order.
pub fn builtin() -> Vec<Arc<dyn SiteExtractor>> {
    vec![
        Arc::new(cna::Cna),
        Arc::new(ct::ChinaTimes),
        Arc::new(ettoday::EtToday),
        Arc::new(ltn::Ltn),
        Arc::new(udn::Udn),
        Arc::new(bbc::Bbc),
        Arc::new(nytimes::NyTimes),
        Arc::new(pts::Pts),
        Arc::new(rfi::Rfi),
        Arc::new(setn::Setn),
        Arc::new(tvbs::Tvbs),
        Arc::new(up::UpMedia),
    ]
}

/// Last non-empty segment of the URL path.
pub(crate) fn path_base(url: &Url) -> String {
    url.path()
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string()
}

/// First value of query parameter `key`, or the empty string.
pub(crate) fn query_value(url: &Url, key: &str) -> String {
    url.query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
        .unwrap_or_default()
}

/// Path without leading slashes, remaining slashes turned into dashes.
pub(crate) fn dashed_path(url: &Url) -> String {
    url.path().trim_start_matches('/').replace('/', "-")
}
