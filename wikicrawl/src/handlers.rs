use anyhow::Context;
use clap::ArgMatches;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use url::Url;
use wikicrawl_core::dump::{DEFAULT_SAVE_PATH, DEFAULT_SEED};
use wikicrawl_core::{
    ConsoleReporter, DumpOptions, DumpOutcome, DumpSummary, FileStore, GraphDumper, PathFinder,
    PathOptions, ProgressCallback, SearchOutcome,
};
use wikicrawl_scanner::WikiFetcher;
use wikicrawl_scanner::wiki::DEFAULT_BASE_URL;

const DEFAULT_TIMEOUT_SECS: u64 = 10;

// Helper functions for argument handling

/// Accept a full page URL, a host-relative one, or a bare title like
/// `Alan Turing`.
pub fn normalize_page_arg(page: &str) -> String {
    let page = page.trim();

    if let Ok(url) = Url::parse(page)
        && matches!(url.scheme(), "http" | "https")
    {
        return page.to_string();
    }

    // Missing scheme, e.g. en.wikipedia.org/wiki/Alan_Turing
    if page.contains("/wiki/") {
        return format!("https://{}", page.trim_start_matches('/'));
    }

    format!("{}/wiki/{}", DEFAULT_BASE_URL, page.replace(' ', "_"))
}

/// Expand `~` in a checkpoint path or prefix
pub fn expand_save_path(path: &str) -> String {
    shellexpand::tilde(path).into_owned()
}

pub fn path_options(args: &ArgMatches) -> PathOptions {
    let defaults = PathOptions::default();

    PathOptions {
        start: args.get_one::<String>("start").map(|p| normalize_page_arg(p)),
        end: args.get_one::<String>("end").map(|p| normalize_page_arg(p)),
        max_iter: *args.get_one::<usize>("max-iter").unwrap_or(&defaults.max_iter),
        save_prefix: args
            .get_one::<String>("save-path")
            .map(|p| expand_save_path(p))
            .unwrap_or(defaults.save_prefix),
        workers: *args.get_one::<usize>("threads").unwrap_or(&defaults.workers),
        resume: args.get_flag("resume"),
    }
}

pub fn dump_options(args: &ArgMatches) -> DumpOptions {
    let defaults = DumpOptions::default();
    let previous_path = args
        .get_one::<String>("resume-from")
        .map(|p| expand_save_path(p));

    DumpOptions {
        stop_count: *args.get_one::<usize>("stop-count").unwrap_or(&defaults.stop_count),
        seed: args
            .get_one::<String>("seed")
            .map(|p| normalize_page_arg(p))
            .unwrap_or_else(|| DEFAULT_SEED.to_string()),
        rand_seed: args.get_flag("rand-seed"),
        save_path: expand_save_path(
            args.get_one::<String>("save-path")
                .map(String::as_str)
                .unwrap_or(DEFAULT_SAVE_PATH),
        ),
        new_dump: previous_path.is_none(),
        previous_path,
        save_increment: *args
            .get_one::<usize>("save-increment")
            .unwrap_or(&defaults.save_increment),
        suppress_output: args.get_flag("suppress-output"),
        workers: *args.get_one::<usize>("threads").unwrap_or(&defaults.workers),
        max_retries: *args.get_one::<usize>("retries").unwrap_or(&defaults.max_retries),
    }
}

fn timeout(args: &ArgMatches) -> u64 {
    *args.get_one::<u64>("timeout").unwrap_or(&DEFAULT_TIMEOUT_SECS)
}

fn progress_spinner(quiet: bool) -> anyhow::Result<ProgressBar> {
    if quiet {
        return Ok(ProgressBar::hidden());
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(100));
    Ok(spinner)
}

/// Status lines go through the spinner so redraws don't tear them. A hidden
/// spinner swallows its lines, so those runs print directly.
fn console_reporter(quiet: bool, spinner: &ProgressBar) -> Arc<ConsoleReporter> {
    let reporter = ConsoleReporter::new().suppressed(quiet);
    if spinner.is_hidden() {
        Arc::new(reporter)
    } else {
        Arc::new(reporter.with_progress_bar(spinner.clone()))
    }
}

fn spinner_callback(spinner: &ProgressBar, label: &'static str) -> ProgressCallback {
    let spinner = spinner.clone();
    Arc::new(move |step: usize, url: String| {
        spinner.set_message(format!("{} {}: {}", label, step, url));
    })
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

pub async fn handle_path(args: &ArgMatches, quiet: bool) {
    if let Err(e) = run_path(args, quiet).await {
        eprintln!("{} Path search failed: {:#}", "✗".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run_path(args: &ArgMatches, quiet: bool) -> anyhow::Result<SearchOutcome> {
    let options = path_options(args);

    if !quiet {
        println!("\n🔎  Searching for the shortest click path");
        println!("Max levels: {}", options.max_iter);
        println!("Workers: {}", options.workers);
        if options.resume {
            println!("Resuming from checkpoint if one exists");
        }
        println!();
    }

    let fetcher = WikiFetcher::with_timeout(timeout(args)).context("Failed to build HTTP client")?;
    let spinner = progress_spinner(quiet)?;
    let reporter = console_reporter(quiet, &spinner);
    let store = Arc::new(FileStore::new("."));

    let finder = PathFinder::new(options, fetcher, store, reporter).await;
    let mut finder = match finder {
        Ok(finder) => finder.with_progress_callback(spinner_callback(&spinner, "Level")),
        Err(e) => {
            spinner.finish_and_clear();
            return Err(e).context("Could not resolve the start and end pages");
        }
    };
    info!("Checkpointing search to {}", finder.checkpoint_key());

    let outcome = finder.find_path().await;
    spinner.finish_and_clear();
    let outcome = outcome.context("Search aborted")?;

    if !quiet {
        match &outcome {
            SearchOutcome::Found { clicks, .. } => {
                println!("{} Path found in {} clicks", "✓".green().bold(), clicks)
            }
            SearchOutcome::Exhausted { .. } => println!(
                "{} No path within the level budget; rerun with --resume and a larger --max-iter to go deeper",
                "→".yellow().bold()
            ),
        }
    }

    Ok(outcome)
}

pub async fn handle_dump(args: &ArgMatches, quiet: bool) {
    match run_dump(args, quiet).await {
        Ok(summary) => {
            if !quiet {
                print_dump_summary(&summary);
            }
        }
        Err(e) => {
            eprintln!("{} Dump failed: {:#}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    }
}

async fn run_dump(args: &ArgMatches, quiet: bool) -> anyhow::Result<DumpSummary> {
    let options = dump_options(args);

    if !quiet {
        println!("\n🕷️  Dumping the link graph");
        match &options.previous_path {
            Some(previous) => println!("Resuming from: {}", previous),
            None if options.rand_seed => println!("Seed: random page"),
            None => println!("Seed: {}", options.seed),
        }
        println!("Stop at: {} nodes", options.stop_count);
        println!("Checkpoint: {} (every {} new nodes)", options.save_path, options.save_increment);
        println!("Workers: {}\n", options.workers);
    }

    let fetcher = WikiFetcher::with_timeout(timeout(args)).context("Failed to build HTTP client")?;
    let spinner = progress_spinner(quiet || options.suppress_output)?;
    let reporter = console_reporter(quiet, &spinner);
    let store = Arc::new(FileStore::new("."));

    let dumper = GraphDumper::new(options, fetcher, store, reporter).await;
    let mut dumper = match dumper {
        Ok(dumper) => dumper.with_progress_callback(spinner_callback(&spinner, "Pass")),
        Err(e) => {
            spinner.finish_and_clear();
            return Err(e).context("Could not initialize the link graph");
        }
    };

    let summary = dumper.start_dump().await;
    spinner.finish_and_clear();
    summary.context("Final checkpoint could not be written")
}

fn print_dump_summary(summary: &DumpSummary) {
    println!();
    print_divider();
    let headline = match summary.outcome {
        DumpOutcome::Complete => "  DUMP COMPLETE".green().bold(),
        DumpOutcome::Exhausted => "  LINK GRAPH EXHAUSTED".yellow().bold(),
    };
    println!("{}", headline);
    print_divider();
    println!(
        "{} Nodes: {}",
        "✓".green().bold(),
        summary.node_count.to_string().cyan()
    );
    println!(
        "{} Edges: {}",
        "✓".green().bold(),
        summary.edge_count.to_string().cyan()
    );
    println!(
        "{} Pages expanded this run: {}",
        "✓".green().bold(),
        summary.expanded.to_string().cyan()
    );
    println!(
        "{} Checkpoints written: {}",
        "✓".green().bold(),
        summary.checkpoint_sizes.len().to_string().cyan()
    );
    println!();
}
