// Shortest-click search between two pages

use crate::ProgressCallback;
use crate::checkpoint::{
    CheckpointStore, companion_key, derive_key, load_json, save_json, strip_page_prefix,
};
use crate::error::{CrawlError, Result};
use crate::report::{Reporter, generate_path_report, unreachable_message};
use crate::tree::CrawlTree;
use futures::stream::{self, StreamExt};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};
use wikicrawl_scanner::LinkFetcher;

pub const DEFAULT_MAX_ITER: usize = 6;
pub const DEFAULT_WORKERS: usize = 8;
const KEY_MAP_SUFFIX: &str = "KEY";
const COMPLETED_FIELD: &str = "Completed";
const LEVEL_FIELD: &str = "Level";

/// Options for a path search
#[derive(Debug, Clone)]
pub struct PathOptions {
    /// Start page; a random page when `None` or off-site
    pub start: Option<String>,
    /// Target page; a random page when `None` or off-site
    pub end: Option<String>,
    /// Number of tree levels, root included
    pub max_iter: usize,
    /// Prepended to checkpoint names, e.g. `Data/`
    pub save_prefix: String,
    /// Concurrent fetches within one level
    pub workers: usize,
    /// Continue from an existing checkpoint for the same endpoints
    pub resume: bool,
}

impl Default for PathOptions {
    fn default() -> Self {
        Self {
            start: None,
            end: None,
            max_iter: DEFAULT_MAX_ITER,
            save_prefix: String::new(),
            workers: DEFAULT_WORKERS,
            resume: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    Found { path: Vec<String>, clicks: usize },
    Exhausted { max_iter: usize },
}

/// Breadth-first search tree from a start page, grown one full level at a time
/// until the target page shows up or the level budget runs out.
pub struct PathFinder<F: LinkFetcher> {
    fetcher: F,
    store: Arc<dyn CheckpointStore>,
    reporter: Arc<dyn Reporter>,
    progress_callback: Option<ProgressCallback>,
    start: String,
    end: String,
    max_iter: usize,
    save_prefix: String,
    workers: usize,
    tree: CrawlTree,
    // Depth of the pending frontier; deeper than the tree when the last
    // expansion found nothing new
    level: usize,
    completed: bool,
    url_path: Option<Vec<String>>,
}

impl<F: LinkFetcher> PathFinder<F> {
    /// Resolves both endpoints (random pages stand in for missing or off-site
    /// ones) and, with `resume`, picks up a saved tree for the same pair.
    pub async fn new(
        options: PathOptions,
        fetcher: F,
        store: Arc<dyn CheckpointStore>,
        reporter: Arc<dyn Reporter>,
    ) -> Result<Self> {
        if options.max_iter == 0 {
            return Err(CrawlError::Config("max_iter must be at least 1".to_string()));
        }
        if options.workers == 0 {
            return Err(CrawlError::Config("workers must be at least 1".to_string()));
        }

        let start = resolve_endpoint(&fetcher, reporter.as_ref(), "Start", options.start).await?;
        let end = resolve_endpoint(&fetcher, reporter.as_ref(), "End", options.end).await?;

        let mut finder = Self {
            fetcher,
            store,
            reporter,
            progress_callback: None,
            tree: CrawlTree::new(start.clone()),
            start,
            end,
            max_iter: options.max_iter,
            save_prefix: options.save_prefix,
            workers: options.workers,
            level: 0,
            completed: false,
            url_path: None,
        };

        if options.resume {
            finder.restore()?;
        }

        Ok(finder)
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn start(&self) -> &str {
        &self.start
    }

    pub fn end(&self) -> &str {
        &self.end
    }

    pub fn tree(&self) -> &CrawlTree {
        &self.tree
    }

    /// The first path found, root first.
    pub fn url_path(&self) -> Option<&[String]> {
        self.url_path.as_deref()
    }

    /// `<prefix><digest(start)>-<digest(end)>.json`
    pub fn checkpoint_key(&self) -> String {
        format!(
            "{}{}-{}.json",
            self.save_prefix,
            derive_key(strip_page_prefix(&self.start)),
            derive_key(strip_page_prefix(&self.end))
        )
    }

    pub fn key_map_key(&self) -> String {
        companion_key(&self.checkpoint_key(), KEY_MAP_SUFFIX)
    }

    fn restore(&mut self) -> Result<()> {
        let key = self.checkpoint_key();
        if !self.store.exists(&key) {
            info!("No checkpoint at {}, starting a new search", key);
            return Ok(());
        }

        let tree: CrawlTree = load_json(self.store.as_ref(), &key)?;
        if tree.root() != self.start {
            return Err(CrawlError::Config(format!(
                "checkpoint {} is rooted at {}, not {}",
                key,
                tree.root(),
                self.start
            )));
        }

        let key_map = match load_json::<Map<String, Value>>(self.store.as_ref(), &self.key_map_key()) {
            Ok(key_map) => Some(key_map),
            Err(e) => {
                warn!("Key map for {} unreadable, assuming incomplete: {}", key, e);
                None
            }
        };
        let field = |name: &str| key_map.as_ref().and_then(|m| m.get(name));

        self.completed = field(COMPLETED_FIELD)
            .and_then(Value::as_bool)
            .unwrap_or(false);
        self.level = field(LEVEL_FIELD)
            .and_then(Value::as_u64)
            .and_then(|level| usize::try_from(level).ok())
            .unwrap_or(0)
            .max(tree.depth());
        self.tree = tree;

        self.reporter.message(&format!(
            "Resumed Tree \"{}\" With {} Pages at Level #{}",
            key,
            self.tree.len(),
            self.level
        ));
        Ok(())
    }

    /// Run the search. Fetch failures skip the page; checkpoint failures are
    /// logged and the search carries on.
    pub async fn find_path(&mut self) -> Result<SearchOutcome> {
        // A resumed tree may already hold the target
        if (self.completed || self.tree.contains(&self.end))
            && let Some(outcome) = self.finish_found().await
        {
            return Ok(outcome);
        }

        let mut frontier = self.tree.nodes_at_depth(self.level);
        self.report_level();
        self.save_tree(false);

        while self.level + 1 < self.max_iter && !frontier.is_empty() {
            let results = self.expand_level(self.level, &frontier).await;
            let mut next = Vec::new();

            for (parent, result) in results {
                match result {
                    Ok(links) => {
                        for link in links {
                            if self.tree.insert(&link, &parent) {
                                next.push(link);
                            }
                        }
                    }
                    Err(e) => warn!("Skipping {}: {}", parent, e),
                }
            }

            self.level += 1;
            self.report_level();
            self.save_tree(false);

            if self.tree.contains(&self.end)
                && let Some(outcome) = self.finish_found().await
            {
                return Ok(outcome);
            }
            frontier = next;
        }

        if frontier.is_empty() {
            debug!("No pages left to expand at level {}", self.level);
        }
        self.reporter.announce(&unreachable_message(self.max_iter));
        Ok(SearchOutcome::Exhausted {
            max_iter: self.max_iter,
        })
    }

    /// Fetch every page of one level on a bounded pool. Results come back in
    /// frontier order so insertion order does not depend on fetch timing.
    async fn expand_level(
        &self,
        level: usize,
        frontier: &[String],
    ) -> Vec<(String, wikicrawl_scanner::error::Result<Vec<String>>)> {
        debug!("Expanding {} pages at level {}", frontier.len(), level);
        let fetcher = &self.fetcher;
        let progress = self.progress_callback.clone();

        stream::iter(frontier.iter().cloned())
            .map(|url| {
                let progress = progress.clone();
                async move {
                    if let Some(callback) = &progress {
                        callback(level, url.clone());
                    }
                    let result = fetcher.fetch_links(&url).await;
                    (url, result)
                }
            })
            .buffered(self.workers)
            .collect()
            .await
    }

    async fn finish_found(&mut self) -> Option<SearchOutcome> {
        let path = self.tree.path_to(&self.end)?;
        self.resolve_path(&path).await;
        self.save_tree(true);
        self.completed = true;

        let clicks = path.len() - 1;
        self.url_path = Some(path.clone());
        Some(SearchOutcome::Found { path, clicks })
    }

    /// Look up page titles along `path` and print the summary. Pages whose
    /// title cannot be fetched are shown by name.
    async fn resolve_path(&self, path: &[String]) {
        let mut titles = Vec::with_capacity(path.len());
        for url in path {
            let title = match self.fetcher.fetch_title(url).await {
                Ok(title) => title,
                Err(e) => {
                    debug!("No title for {}: {}", url, e);
                    strip_page_prefix(url).replace('_', " ")
                }
            };
            titles.push(title);
        }

        self.reporter
            .announce(&generate_path_report(&titles, path, self.tree.len()));
    }

    fn report_level(&self) {
        self.reporter.message(&format!(
            "Size at Level #{}: {}",
            self.level,
            self.tree.len()
        ));
    }

    fn save_tree(&self, finished: bool) -> bool {
        let key = self.checkpoint_key();

        let start_slug = strip_page_prefix(&self.start);
        let end_slug = strip_page_prefix(&self.end);
        let mut key_map = Map::new();
        key_map.insert(derive_key(start_slug), Value::String(start_slug.to_string()));
        key_map.insert(derive_key(end_slug), Value::String(end_slug.to_string()));
        key_map.insert(COMPLETED_FIELD.to_string(), Value::Bool(finished));
        key_map.insert(LEVEL_FIELD.to_string(), Value::from(self.level));

        let saved = save_json(self.store.as_ref(), &key, &self.tree)
            .and_then(|_| save_json(self.store.as_ref(), &self.key_map_key(), &key_map));

        match saved {
            Ok(()) => {
                self.reporter.message(&format!("Tree Saved as \"{}\"", key));
                true
            }
            Err(e) => {
                warn!("Could not save tree {}: {}", key, e);
                self.reporter
                    .message(&format!("Tree Save Failed for \"{}\": {}", key, e));
                false
            }
        }
    }
}

async fn resolve_endpoint<F: LinkFetcher>(
    fetcher: &F,
    reporter: &dyn Reporter,
    label: &str,
    candidate: Option<String>,
) -> Result<String> {
    let page = match candidate {
        Some(page) => page,
        None => fetcher.resolve_random().await?,
    };
    reporter.message(&format!("{}: {}", label, page));

    if fetcher.is_valid(&page) {
        return Ok(page);
    }

    reporter.message(&format!("Invalid {} URL, Using Random Instead", label));
    let page = fetcher.resolve_random().await?;
    reporter.message(&format!("{}: {}", label, page));
    Ok(page)
}
