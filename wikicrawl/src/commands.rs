use clap::{arg, command};

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("wikicrawl")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("wikicrawl")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .arg(arg!(-v --"verbose" "Show debug logging on stderr").required(false))
        .subcommand_required(false)
        .subcommand(
            command!("path")
                .about(
                    "Find the fewest clicks between two pages by expanding every link, one \
                level at a time. Progress is checkpointed after each level.",
                )
                .arg(
                    arg!(-s --"start" <PAGE>)
                        .required(false)
                        .help("Start page as a URL or title (default: a random page)"),
                )
                .arg(
                    arg!(-e --"end" <PAGE>)
                        .required(false)
                        .help("Target page as a URL or title (default: a random page)"),
                )
                .arg(
                    arg!(-m --"max-iter" <LEVELS>)
                        .required(false)
                        .help("Number of tree levels to build, the start page included")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("6"),
                )
                .arg(
                    arg!(-p --"save-path" <PREFIX>)
                        .required(false)
                        .help("Prefix for checkpoint files, e.g. Data/")
                        .default_value(""),
                )
                .arg(
                    arg!(-r --"resume")
                        .required(false)
                        .help("Continue from the checkpoint for the same start and end")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(-t --"threads" <NUM_WORKERS>)
                        .required(false)
                        .help("The number of concurrent page fetches per level.")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("8"),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Request timeout in seconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("10"),
                ),
        )
        .subcommand(
            command!("dump")
                .about(
                    "Build the link graph reachable from a seed page, checkpointing as it \
                grows. Can resume from a previous dump.",
                )
                .arg(
                    arg!(-n --"stop-count" <NODES>)
                        .required(false)
                        .help("Stop once the graph holds this many pages")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("5000000"),
                )
                .arg(
                    arg!(-s --"seed" <PAGE>)
                        .required(false)
                        .help("Seed page as a URL or title")
                        .default_value("https://en.wikipedia.org/wiki/United_States")
                        .conflicts_with("rand-seed"),
                )
                .arg(
                    arg!(--"rand-seed")
                        .required(false)
                        .help("Start from a random page instead of the seed")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(-o --"save-path" <PATH>)
                        .required(false)
                        .help("Graph checkpoint file; the visited set is written beside it")
                        .default_value("Data/fullnet1.json"),
                )
                .arg(
                    arg!(-r --"resume-from" <PATH>)
                        .required(false)
                        .help("Continue a previous dump from its graph checkpoint")
                        .conflicts_with_all(["seed", "rand-seed"]),
                )
                .arg(
                    arg!(-i --"save-increment" <NODES>)
                        .required(false)
                        .help("Graph growth between periodic checkpoints")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("100000"),
                )
                .arg(
                    arg!(--"suppress-output")
                        .required(false)
                        .help("Only report the final outcome")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(-t --"threads" <NUM_WORKERS>)
                        .required(false)
                        .help("The number of concurrent page fetches.")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("1"),
                )
                .arg(
                    arg!(--"retries" <ATTEMPTS>)
                        .required(false)
                        .help("Fetch attempts per page before it is left for a later run")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("3"),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Request timeout in seconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("10"),
                ),
        )
}
