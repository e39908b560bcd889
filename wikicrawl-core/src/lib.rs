pub mod checkpoint;
pub mod dump;
pub mod error;
pub mod graph;
pub mod path;
pub mod report;
pub mod tree;

use colored::Colorize;
use std::sync::Arc;

pub use checkpoint::{CheckpointError, CheckpointStore, FileStore, MemoryStore};
pub use dump::{DumpOptions, DumpOutcome, DumpSummary, GraphDumper};
pub use error::CrawlError;
pub use graph::{LinkGraph, VisitedSet};
pub use path::{PathFinder, PathOptions, SearchOutcome};
pub use report::{ConsoleReporter, MemoryReporter, Reporter};
pub use tree::CrawlTree;

/// Called once per page expansion with the level (path search) or pass
/// (graph dump) number and the page being fetched.
pub type ProgressCallback = Arc<dyn Fn(usize, String) + Send + Sync>;

pub fn print_banner() {
    println!(
        "{}",
        r#"
          _ _    _                          _
__      _(_) | _(_) ___ _ __ __ ___      _| |
\ \ /\ / / | |/ / |/ __| '__/ _` \ \ /\ / / |
 \ V  V /| |   <| | (__| | | (_| |\ V  V /| |
  \_/\_/ |_|_|\_\_|\___|_|  \__,_| \_/\_/ |_|
"#
        .bright_cyan()
        .bold()
    );
    println!(
        "  {} {}\n",
        "wikicrawl".bright_white().bold(),
        env!("CARGO_PKG_VERSION").dimmed()
    );
}
