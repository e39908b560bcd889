// Long-running dump of the whole link graph, checkpointed and resumable

use crate::ProgressCallback;
use crate::checkpoint::{CheckpointError, CheckpointStore, companion_key, load_json, save_json};
use crate::error::{CrawlError, Result};
use crate::graph::{LinkGraph, VisitedSet};
use crate::report::Reporter;
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use wikicrawl_scanner::LinkFetcher;

pub const DEFAULT_STOP_COUNT: usize = 5_000_000;
pub const DEFAULT_SEED: &str = "https://en.wikipedia.org/wiki/United_States";
pub const DEFAULT_SAVE_PATH: &str = "Data/fullnet1.json";
pub const DEFAULT_SAVE_INCREMENT: usize = 100_000;
pub const DEFAULT_MAX_RETRIES: usize = 3;
const VISITED_SUFFIX: &str = "dict";

/// Options for a graph dump
#[derive(Debug, Clone)]
pub struct DumpOptions {
    /// Stop once the graph holds at least this many pages
    pub stop_count: usize,
    pub seed: String,
    /// Ignore `seed` and start from a random page
    pub rand_seed: bool,
    /// Checkpoint name for the graph; the visited set goes next to it
    pub save_path: String,
    /// Start from the seed (true) or from `previous_path` (false)
    pub new_dump: bool,
    pub previous_path: Option<String>,
    /// Minimum growth in pages between periodic checkpoints
    pub save_increment: usize,
    pub suppress_output: bool,
    /// Concurrent fetches
    pub workers: usize,
    /// Fetch attempts per page before it is left for a later run
    pub max_retries: usize,
}

impl Default for DumpOptions {
    fn default() -> Self {
        Self {
            stop_count: DEFAULT_STOP_COUNT,
            seed: DEFAULT_SEED.to_string(),
            rand_seed: false,
            save_path: DEFAULT_SAVE_PATH.to_string(),
            new_dump: true,
            previous_path: None,
            save_increment: DEFAULT_SAVE_INCREMENT,
            suppress_output: false,
            workers: 1,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl DumpOptions {
    pub fn validate(&self) -> Result<()> {
        if self.save_increment == 0 {
            return Err(CrawlError::Config("save_increment must be at least 1".to_string()));
        }
        if self.workers == 0 {
            return Err(CrawlError::Config("workers must be at least 1".to_string()));
        }
        if self.max_retries == 0 {
            return Err(CrawlError::Config("max_retries must be at least 1".to_string()));
        }
        if !self.new_dump && self.previous_path.is_none() {
            return Err(CrawlError::Config(
                "a previous checkpoint path is required to resume a dump".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpOutcome {
    /// The graph reached `stop_count` pages
    Complete,
    /// Every reachable page was expanded (or given up on) below `stop_count`
    Exhausted,
}

#[derive(Debug, Clone)]
pub struct DumpSummary {
    pub outcome: DumpOutcome,
    pub node_count: usize,
    pub edge_count: usize,
    /// Pages expanded during this run
    pub expanded: usize,
    /// Graph size at each checkpoint of this run, final one included
    pub checkpoint_sizes: Vec<usize>,
}

/// Builds a directed graph of every page reachable from a seed.
///
/// Each pass expands a snapshot of the pages not yet visited, in the order they
/// were discovered; pages found during a pass wait for the next one. A page is
/// marked visited only after its links are recorded, and visited pages are
/// never fetched again, including after a resume from a checkpoint.
pub struct GraphDumper<F: LinkFetcher> {
    fetcher: F,
    store: Arc<dyn CheckpointStore>,
    reporter: Arc<dyn Reporter>,
    progress_callback: Option<ProgressCallback>,
    options: DumpOptions,
    seed: String,
    graph: LinkGraph,
    visited: VisitedSet,
    failures: HashMap<String, usize>,
    next_save: usize,
    expanded: usize,
    checkpoint_sizes: Vec<usize>,
}

impl<F: LinkFetcher> GraphDumper<F> {
    /// A new dump starts from the (validated) seed. A resumed dump loads the
    /// graph at `previous_path` and its visited set; a load failure is returned.
    pub async fn new(
        options: DumpOptions,
        fetcher: F,
        store: Arc<dyn CheckpointStore>,
        reporter: Arc<dyn Reporter>,
    ) -> Result<Self> {
        options.validate()?;
        let quiet = options.suppress_output;

        let (seed, graph, visited) = match (options.new_dump, options.previous_path.as_deref()) {
            (false, Some(previous)) => {
                alert(reporter.as_ref(), quiet, "Initializing Previous Network...");
                let (graph, visited) = match load_checkpoint(store.as_ref(), previous) {
                    Ok(loaded) => loaded,
                    Err(e) => {
                        alert(reporter.as_ref(), quiet, "Graph Initialization Failed!");
                        return Err(e.into());
                    }
                };
                alert(
                    reporter.as_ref(),
                    quiet,
                    &format!("Previous Network Initialized With {} Nodes", graph.len()),
                );
                let seed = graph.nodes().next().unwrap_or_default().to_string();
                (seed, graph, visited)
            }
            _ => {
                let seed = resolve_seed(&options, &fetcher, reporter.as_ref()).await?;
                alert(reporter.as_ref(), quiet, &format!("Seed Page Set to: {}", seed));
                let graph = LinkGraph::with_seed(&seed);
                (seed, graph, VisitedSet::new())
            }
        };

        Ok(Self {
            fetcher,
            store,
            reporter,
            progress_callback: None,
            options,
            seed,
            graph,
            visited,
            failures: HashMap::new(),
            next_save: 0,
            expanded: 0,
            checkpoint_sizes: Vec::new(),
        })
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }

    pub fn graph(&self) -> &LinkGraph {
        &self.graph
    }

    pub fn visited(&self) -> &VisitedSet {
        &self.visited
    }

    pub fn visited_key(&self) -> String {
        companion_key(&self.options.save_path, VISITED_SUFFIX)
    }

    /// Expand pages until the graph holds `stop_count` pages or nothing is
    /// left to expand, then write the final checkpoint.
    pub async fn start_dump(&mut self) -> Result<DumpSummary> {
        let mut pass = 0;

        let outcome = loop {
            if self.graph.len() >= self.options.stop_count {
                break DumpOutcome::Complete;
            }
            let frontier = self.frontier();
            if frontier.is_empty() {
                break DumpOutcome::Exhausted;
            }

            pass += 1;
            debug!("Pass {}: {} pages to expand", pass, frontier.len());
            if self.run_pass(pass, &frontier).await {
                break DumpOutcome::Complete;
            }
        };

        let node_count = self.graph.len();
        match outcome {
            // Requested count; the save line below carries the real size
            DumpOutcome::Complete => self.reporter.announce(&format!(
                "Program Complete! Node Count Reached {}",
                self.options.stop_count
            )),
            DumpOutcome::Exhausted => self.reporter.announce(&format!(
                "Link Graph Exhausted! No Pages Left to Expand at {} Nodes",
                node_count
            )),
        }

        self.save_checkpoint()?;
        self.reporter.announce(&timestamp());
        self.reporter
            .announce(&format!("File Saved! # of Nodes:{}", node_count));

        Ok(DumpSummary {
            outcome,
            node_count,
            edge_count: self.graph.edge_count(),
            expanded: self.expanded,
            checkpoint_sizes: self.checkpoint_sizes.clone(),
        })
    }

    /// Unvisited pages that still have fetch attempts left, in discovery order.
    fn frontier(&self) -> Vec<String> {
        self.graph
            .nodes()
            .filter(|page| !self.visited.contains(page))
            .filter(|page| {
                self.failures
                    .get(*page)
                    .is_none_or(|attempts| *attempts < self.options.max_retries)
            })
            .map(str::to_string)
            .collect()
    }

    /// Returns true once the stop count is reached. Every fetch of a chunk
    /// settles before its results are applied, so a checkpoint never sees a
    /// half-applied chunk and no fetched result is thrown away.
    async fn run_pass(&mut self, pass: usize, frontier: &[String]) -> bool {
        for chunk in frontier.chunks(self.options.workers) {
            let fetcher = &self.fetcher;
            let progress = self.progress_callback.clone();
            let fetches = chunk.iter().map(|url| {
                let progress = progress.clone();
                async move {
                    if let Some(callback) = &progress {
                        callback(pass, url.clone());
                    }
                    (url.clone(), fetcher.fetch_links(url).await)
                }
            });
            let results = join_all(fetches).await;

            for (url, result) in results {
                match result {
                    Ok(links) => self.record_links(&url, &links),
                    Err(e) => self.defer(&url, &e.to_string()),
                }
                self.maybe_checkpoint();
            }

            if self.graph.len() >= self.options.stop_count {
                return true;
            }
        }
        false
    }

    fn record_links(&mut self, url: &str, links: &[String]) {
        for link in links {
            self.graph.add_edge(url, link);
        }
        self.visited.mark(url);
        self.failures.remove(url);
        self.expanded += 1;
    }

    /// A failed page stays unvisited so a later pass (or run) retries it.
    fn defer(&mut self, url: &str, error: &str) {
        let attempts = self.failures.entry(url.to_string()).or_insert(0);
        *attempts += 1;
        if *attempts >= self.options.max_retries {
            warn!("Giving up on {} for this run after {} attempts: {}", url, attempts, error);
        } else {
            warn!("Deferring {} (attempt {}): {}", url, attempts, error);
        }
    }

    /// Checkpoint as soon as the graph outgrows the threshold, then move the
    /// threshold `save_increment` past the current size.
    fn maybe_checkpoint(&mut self) {
        let nodes = self.graph.len();
        if nodes <= self.next_save {
            return;
        }
        self.next_save = nodes + self.options.save_increment;

        self.alert(&timestamp());
        match self.save_checkpoint() {
            Ok(()) => self.alert(&format!("File Saved! # of Nodes:{}", nodes)),
            Err(e) => {
                warn!("Checkpoint at {} nodes failed, retrying at the next threshold: {}", nodes, e);
                self.alert(&format!("File Save Failed! # of Nodes:{} ({})", nodes, e));
            }
        }
    }

    fn save_checkpoint(&mut self) -> std::result::Result<(), CheckpointError> {
        save_json(self.store.as_ref(), &self.options.save_path, &self.graph)?;
        save_json(self.store.as_ref(), &self.visited_key(), &self.visited)?;
        info!(
            "Checkpointed {} nodes ({} visited) to {}",
            self.graph.len(),
            self.visited.len(),
            self.options.save_path
        );
        self.checkpoint_sizes.push(self.graph.len());
        Ok(())
    }

    fn alert(&self, line: &str) {
        alert(self.reporter.as_ref(), self.options.suppress_output, line);
    }
}

fn alert(reporter: &dyn Reporter, suppressed: bool, line: &str) {
    if !suppressed {
        reporter.message(line);
    }
}

fn timestamp() -> String {
    chrono::Local::now().format("%a %b %e %H:%M:%S %Y").to_string()
}

/// Graph blob at `previous` plus the visited set stored beside it.
pub fn load_checkpoint(
    store: &dyn CheckpointStore,
    previous: &str,
) -> std::result::Result<(LinkGraph, VisitedSet), CheckpointError> {
    let graph: LinkGraph = load_json(store, previous)?;
    let visited: VisitedSet = load_json(store, &companion_key(previous, VISITED_SUFFIX))?;
    Ok((graph, visited))
}

async fn resolve_seed<F: LinkFetcher>(
    options: &DumpOptions,
    fetcher: &F,
    reporter: &dyn Reporter,
) -> Result<String> {
    if options.rand_seed {
        return Ok(fetcher.resolve_random().await?);
    }
    if fetcher.is_valid(&options.seed) {
        return Ok(options.seed.clone());
    }
    alert(reporter, options.suppress_output, "Invalid Seed Page! Using Random Page");
    Ok(fetcher.resolve_random().await?)
}
