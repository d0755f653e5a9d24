use std::io::{IsTerminal, Read};
use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand};
use miette::{Context, IntoDiagnostic, Result};
use tracing::debug;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use strata_core::{OutputFormat, StrataConfig};
use strata_history::commit::{sort_newest_first, CommitRecord};
use strata_history::matrix::ActivityMatrix;
use strata_history::mining::{mine_history, MiningOptions};
use strata_history::report::SegmentReport;
use strata_history::rollup::Rollup;
use strata_history::{numstat, segment, SegmentOptions};

#[derive(Parser)]
#[command(
    name = "strata",
    version,
    about = "Segment git history into activity periods",
    long_about = "Strata splits a repository's history into periods bounded by contributor\n\
                   turnover and quiet gaps, then reports who worked in each period, how\n\
                   many lines churned, and which directories moved.\n\n\
                   Examples:\n  \
                     strata segments --path .                  Segment the current repository\n  \
                     strata segments --author-threshold 60     Treat 60 idle days as a departure\n  \
                     git log ... | strata segments --log -     Segment piped numstat output\n  \
                     strata matrix --depth 1 --hide vendor     Day x directory activity grid\n  \
                     strata init                               Write a default .strata.toml"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (default: .strata.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        global = true,
        default_value = "text",
        long_help = "Output format for command results.\n\n\
                       Formats:\n  \
                         text      Human-readable segment blocks (default)\n  \
                         json      Machine-readable JSON with camelCase keys\n  \
                         markdown  GitHub-flavored Markdown"
    )]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Split history into segments and report their statistics
    #[command(long_about = "Split history into segments and report their statistics.\n\n\
        A new segment starts when an author appears for the first time or returns after\n\
        a long absence, when an author makes their last commit before a long absence,\n\
        or when the whole project goes quiet for longer than --days-threshold.\n\n\
        Examples:\n  strata segments --path .\n  strata segments --depth 1 --limit 5\n  strata segments --log history.txt --format json")]
    Segments {
        #[command(flatten)]
        source: SourceArgs,

        /// Quiet days between commits that split a segment (default: 10)
        #[arg(long)]
        days_threshold: Option<i64>,

        /// Idle days that count as an author leaving or returning (default: 90)
        #[arg(long)]
        author_threshold: Option<i64>,

        /// Directory depth for churn grouping, 0 for whole paths (default: 2)
        #[arg(long)]
        depth: Option<usize>,

        /// Never group deeper than this many directories
        #[arg(long)]
        max_group_depth: Option<usize>,

        /// Maximum authors and directories shown per segment (default: 10)
        #[arg(long, default_value = "10")]
        limit: usize,
    },
    /// Build a day x directory activity matrix
    #[command(long_about = "Build a day x directory activity matrix.\n\n\
        Each cell holds 0 for no activity or the 1-based index of the author of the\n\
        newest commit that touched the directory group on that day. Output is JSON.\n\n\
        Examples:\n  strata matrix --depth 1\n  strata matrix --prefix src/ --hide generated")]
    Matrix {
        #[command(flatten)]
        source: SourceArgs,

        /// Directory depth for row grouping, 0 for whole paths (default: 2)
        #[arg(long)]
        depth: Option<usize>,

        /// Keep only groups starting with this prefix
        #[arg(long)]
        prefix: Option<String>,

        /// Drop groups containing this text (repeatable)
        #[arg(long)]
        hide: Vec<String>,
    },
    /// Create a default .strata.toml configuration file
    #[command(long_about = "Create a default .strata.toml configuration file.\n\n\
        Generates a commented template with all available options.\n\
        Fails if .strata.toml already exists.")]
    Init,
    /// Generate shell completion scripts
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Where commits come from: a repository walk or `git log --numstat` text.
#[derive(clap::Args)]
struct SourceArgs {
    /// Repository path (default: current directory)
    #[arg(long, default_value = ".")]
    path: PathBuf,

    /// Read `git log --numstat` output from a file, or `-` for stdin
    #[arg(
        long,
        long_help = "Read history from `git log --numstat` output instead of opening the repository.\n\n\
            Use `-` for stdin. The expected format is produced by:\n  \
            git log --no-merges --numstat --date=short --format='--commit--%h%x09%cd%x09%an %ae%x09%s'"
    )]
    log: Option<PathBuf>,

    /// Only include commits from the last N days
    #[arg(long)]
    since: Option<u64>,

    /// Branch to walk (default: HEAD)
    #[arg(long)]
    branch: Option<String>,
}

fn print_welcome() {
    let version = env!("CARGO_PKG_VERSION");

    println!("strata v{version} - segment git history into activity periods\n");

    println!("Quick start:");
    println!("  strata init                   Create a .strata.toml config file");
    println!("  strata segments --path .      Segment the current repository\n");

    println!("All commands:");
    println!("  segments  Activity periods with authors, churn and directories");
    println!("  matrix    Day x directory activity grid as JSON");
    println!("  init      Create default configuration\n");

    println!("Run 'strata <command> --help' for details.");
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(filter)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<StrataConfig> {
    let config = match path {
        Some(path) => StrataConfig::from_file(path)?,
        None => {
            let default_path = Path::new(".strata.toml");
            if default_path.exists() {
                StrataConfig::from_file(default_path)?
            } else {
                StrataConfig::default()
            }
        }
    };
    Ok(config)
}

fn read_log_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut input = String::new();
        std::io::stdin()
            .read_to_string(&mut input)
            .into_diagnostic()
            .wrap_err("reading stdin")?;
        return Ok(input);
    }
    std::fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err(format!("reading {}", path.display()))
}

/// Load commits newest-first from the log text or the repository.
fn load_commits(source: &SourceArgs, config: &StrataConfig) -> Result<Vec<CommitRecord>> {
    if let Some(ref log) = source.log {
        if log == Path::new("-") && std::io::stdin().is_terminal() {
            miette::bail!(miette::miette!(
                help = "Pipe history to strata, e.g.: git log --no-merges --numstat ... | strata segments --log -",
                "No input on stdin"
            ));
        }
        let text = read_log_input(log)?;
        let mut commits = numstat::parse_log(&text)?;
        sort_newest_first(&mut commits);
        eprintln!("Read {} commits from {}.", commits.len(), log.display());
        return Ok(commits);
    }

    // Hint: not a git repository
    if git2::Repository::discover(&source.path).is_err() {
        miette::bail!(miette::miette!(
            help = "Run strata from inside a git repository, specify --path to one, or pass --log",
            "Not a git repository: {}",
            source.path.display()
        ));
    }

    let mut options = MiningOptions::from(&config.mining);
    options.progress = std::io::stderr().is_terminal();
    if source.since.is_some() {
        options.since_days = source.since;
    }
    if source.branch.is_some() {
        options.branch = source.branch.clone();
    }

    match options.since_days {
        Some(days) => eprintln!(
            "Mining git history at {} (last {days} days)...",
            source.path.display()
        ),
        None => eprintln!("Mining git history at {}...", source.path.display()),
    }
    let commits = mine_history(&source.path, &options)?;
    eprintln!("Analyzed {} commits.", commits.len());
    Ok(commits)
}

const DEFAULT_CONFIG: &str = r#"# Strata Configuration

[segments]
# Quiet days between consecutive commits that start a new segment
# days_threshold = 10
# Idle days after which an author counts as departed or returning
# author_threshold = 90
# Directory depth for churn grouping (0 keeps whole paths)
# depth = 2
# Never group deeper than this many directories
# max_group_depth = 2

[mining]
# Only read commits from the last N days
# since_days = 365
# Skip commits touching more files than this
# max_files_per_commit = 500
# Branch to walk instead of HEAD
# branch = "main"
# include_merges = false
"#;

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .into_diagnostic()?;
    human_panic::setup_panic!();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(cli.config.as_deref())?;
    debug!(format = %cli.format, ?config, "loaded configuration");

    match cli.command {
        None => {
            print_welcome();
            return Ok(());
        }
        Some(Command::Segments {
            ref source,
            days_threshold,
            author_threshold,
            depth,
            max_group_depth,
            limit,
        }) => {
            let defaults = &config.segments;
            let options = SegmentOptions {
                days_threshold: days_threshold.unwrap_or(defaults.days_threshold),
                author_threshold: author_threshold.unwrap_or(defaults.author_threshold),
                rollup: Rollup::new(depth.unwrap_or(defaults.depth))
                    .with_cap(max_group_depth.or(defaults.max_group_depth)),
            };
            if options.days_threshold < 0 || options.author_threshold < 0 {
                miette::bail!("thresholds must be zero or more days");
            }

            let commits = load_commits(source, &config)?;
            let segments = segment(&commits, &options)?;
            eprintln!("Found {} segments.", segments.len());

            let report = SegmentReport::new(commits.len(), segments);
            print!("{}", report.render(cli.format, limit)?);
        }
        Some(Command::Matrix {
            ref source,
            depth,
            ref prefix,
            ref hide,
        }) => {
            if cli.format == OutputFormat::Markdown {
                miette::bail!("Markdown output is not supported for the matrix subcommand.");
            }

            let rollup = Rollup::new(depth.unwrap_or(config.segments.depth))
                .with_cap(config.segments.max_group_depth);
            let commits = load_commits(source, &config)?;

            let mut matrix = ActivityMatrix::build(&commits, &rollup)?;
            if let Some(prefix) = prefix {
                matrix = matrix.for_path(prefix);
            }
            if !hide.is_empty() {
                matrix = matrix.hide(hide);
            }

            println!(
                "{}",
                serde_json::to_string_pretty(&matrix).into_diagnostic()?
            );
        }
        Some(Command::Init) => {
            let path = Path::new(".strata.toml");
            if path.exists() {
                miette::bail!(".strata.toml already exists");
            }
            std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Created .strata.toml with default configuration");
        }
        Some(Command::Completions { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "strata", &mut std::io::stdout());
        }
    }

    Ok(())
}
