use crate::error::{FetchError, Result};
use crate::fetcher::LinkFetcher;
use reqwest::Client;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://en.wikipedia.org";
pub const DEFAULT_CITATION_MARKER: &str = ":Citation_needed";
const TITLE_SUFFIX: &str = " - Wikipedia";
const RANDOM_PAGE: &str = "/wiki/Special:Random";

/// Live fetcher for a MediaWiki site.
///
/// Only links inside `<p>` elements are followed, which keeps navigation boxes,
/// infoboxes and footers out of the crawl.
pub struct WikiFetcher {
    client: Client,
    base: Url,
    host: String,
    wiki_prefix: String,
    citation_marker: String,
    paragraph_links: Selector,
    title: Selector,
    article_tab: Selector,
}

impl WikiFetcher {
    pub fn new() -> Result<Self> {
        Self::with_timeout(10)
    }

    pub fn with_timeout(timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .user_agent("wikicrawl/0.1 (link graph research crawler)")
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs.div_ceil(2)))
            .pool_max_idle_per_host(50)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        let mut fetcher = Self {
            client,
            base: Url::parse(DEFAULT_BASE_URL)
                .map_err(|e| FetchError::InvalidUrl(e.to_string()))?,
            host: String::new(),
            wiki_prefix: String::new(),
            citation_marker: DEFAULT_CITATION_MARKER.to_string(),
            paragraph_links: selector("p a[href]")?,
            title: selector("title")?,
            article_tab: selector(r#"a[accesskey="c"]"#)?,
        };
        fetcher.rebase()?;
        Ok(fetcher)
    }

    /// Point the fetcher at another site root (a mirror, or a mock server).
    pub fn with_base_url(mut self, base: &str) -> Result<Self> {
        self.base = Url::parse(base).map_err(|e| FetchError::InvalidUrl(format!("{base}: {e}")))?;
        self.rebase()?;
        Ok(self)
    }

    pub fn with_citation_marker(mut self, marker: impl Into<String>) -> Self {
        self.citation_marker = marker.into();
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn rebase(&mut self) -> Result<()> {
        let host = self
            .base
            .host_str()
            .ok_or_else(|| FetchError::InvalidUrl(format!("{} has no host", self.base)))?;
        self.host = match self.base.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        self.wiki_prefix = self
            .base
            .join("/wiki/")
            .map_err(|e| FetchError::InvalidUrl(e.to_string()))?
            .to_string();
        Ok(())
    }

    async fn get_page(&self, url: &str) -> Result<(Url, String)> {
        debug!("Fetching {}", url);

        let start = Instant::now();
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().clone();
        let body = response.text().await?;
        debug!("Fetched {} ({} bytes) in {:?}", url, body.len(), start.elapsed());
        Ok((final_url, body))
    }

    /// Outbound article links in the paragraphs of `html`.
    ///
    /// Kept hrefs are root-relative, on-site, not citation-needed markers and
    /// not anchors; duplicates collapse to their first occurrence.
    pub fn extract_links(&self, html: &str) -> Vec<String> {
        let document = Html::parse_document(html);

        let mut seen = HashSet::new();
        let mut links = Vec::new();

        for element in document.select(&self.paragraph_links) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            if !self.is_followable(href) {
                continue;
            }
            match self.base.join(href) {
                Ok(absolute) => {
                    let absolute = absolute.to_string();
                    if seen.insert(absolute.clone()) {
                        links.push(absolute);
                    }
                }
                Err(e) => debug!("Skipping unjoinable href {}: {}", href, e),
            }
        }

        links
    }

    fn is_followable(&self, href: &str) -> bool {
        href.starts_with('/')
            && !href.contains(&self.host)
            && !href.contains(&self.citation_marker)
            && !href.contains("//")
            && !href.contains('#')
    }

    /// Page title without the site suffix.
    pub fn extract_title(&self, html: &str) -> Option<String> {
        let document = Html::parse_document(html);

        document.select(&self.title).next().map(|title| {
            let text = title.text().collect::<String>();
            let text = text.trim();
            text.strip_suffix(TITLE_SUFFIX).unwrap_or(text).to_string()
        })
    }

    /// The article tab link (`accesskey="c"`), which names the canonical page
    /// even when the request went through a redirect.
    fn extract_article_href(&self, html: &str) -> Option<String> {
        let document = Html::parse_document(html);

        document
            .select(&self.article_tab)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(str::to_string)
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| FetchError::Parse(format!("selector {css}: {e}")))
}

impl LinkFetcher for WikiFetcher {
    async fn fetch_links(&self, url: &str) -> Result<Vec<String>> {
        let (_, body) = self.get_page(url).await?;
        let links = self.extract_links(&body);
        debug!("{} -> {} links", url, links.len());
        Ok(links)
    }

    async fn resolve_random(&self) -> Result<String> {
        let random = self
            .base
            .join(RANDOM_PAGE)
            .map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
        let (final_url, body) = self.get_page(random.as_str()).await?;

        let resolved = match self.extract_article_href(&body) {
            Some(href) => self
                .base
                .join(&href)
                .map_err(|e| FetchError::InvalidUrl(format!("{href}: {e}")))?
                .to_string(),
            None => final_url.to_string(),
        };

        if self.is_valid(&resolved) {
            Ok(resolved)
        } else {
            warn!("Random page resolved to off-site URL {}", resolved);
            Err(FetchError::InvalidUrl(resolved))
        }
    }

    async fn fetch_title(&self, url: &str) -> Result<String> {
        let (_, body) = self.get_page(url).await?;
        self.extract_title(&body)
            .ok_or_else(|| FetchError::Parse(format!("{url} has no <title>")))
    }

    fn is_valid(&self, url: &str) -> bool {
        url.contains(&self.wiki_prefix)
    }
}
