use crate::error::Result;
use std::future::Future;
use std::sync::Arc;

/// Source of outbound links for a page.
///
/// Engines only talk to the site through this trait, so anything that can map a
/// page identifier to its outbound identifiers can drive a crawl (the live
/// [`WikiFetcher`](crate::WikiFetcher), or a scripted link table in tests).
pub trait LinkFetcher: Send + Sync {
    /// Outbound page identifiers found in the page body, de-duplicated and in
    /// document order.
    fn fetch_links(&self, url: &str) -> impl Future<Output = Result<Vec<String>>> + Send;

    /// A random page that satisfies [`LinkFetcher::is_valid`].
    fn resolve_random(&self) -> impl Future<Output = Result<String>> + Send;

    /// Human-readable title of a page.
    fn fetch_title(&self, url: &str) -> impl Future<Output = Result<String>> + Send;

    /// Whether `url` belongs to the crawled site.
    fn is_valid(&self, url: &str) -> bool;
}

impl<T: LinkFetcher> LinkFetcher for Arc<T> {
    fn fetch_links(&self, url: &str) -> impl Future<Output = Result<Vec<String>>> + Send {
        (**self).fetch_links(url)
    }

    fn resolve_random(&self) -> impl Future<Output = Result<String>> + Send {
        (**self).resolve_random()
    }

    fn fetch_title(&self, url: &str) -> impl Future<Output = Result<String>> + Send {
        (**self).fetch_title(url)
    }

    fn is_valid(&self, url: &str) -> bool {
        (**self).is_valid(url)
    }
}
