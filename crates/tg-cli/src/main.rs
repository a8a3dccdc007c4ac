#![forbid(unsafe_code)]

//! task-graph CLI - follow tasklist references between GitHub issues and
//! render the result.
//!
//! # Commands
//!
//! - `mermaid`: Render the discovered graph as a Mermaid flowchart
//! - `list`: Print the discovered nodes and edges as plain text

use std::fmt::Write as _;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tg_core::{IssueRef, TaskGraph};
use tg_github::{DEFAULT_TOKEN_PATH, GitHubClient, GitHubConfig, load_access_token};
use tg_graph::{AccumulateConfig, Accumulator, Logger};
use tg_parser::parse_short;
use tg_render::{Wrapping, render, wrap};
use tracing::{Dispatch, debug};

mod config;

use config::FileConfig;

/// task-graph CLI - discover and render GitHub issue task graphs.
#[derive(Debug, Parser)]
#[command(
    name = "task-graph",
    version,
    about = "Discover GitHub issue task graphs and render them as Mermaid",
    long_about = "Starting from one or more root issues, follows the references found in\n\
        ```[tasklist] blocks of each issue body and renders the discovered graph."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// File holding a GitHub access token
    #[arg(short = 'a', long, global = true)]
    access_token: Option<String>,

    /// Root issue in short form, e.g. owner/repo#12 (repeatable)
    #[arg(short = 'i', long = "issue", global = true)]
    issues: Vec<String>,

    /// Owner used for bare #n issues and --issue-number
    #[arg(short = 'o', long, global = true)]
    issue_owner: Option<String>,

    /// Repository used for bare #n issues and --issue-number
    #[arg(short = 'r', long, global = true)]
    issue_repo: Option<String>,

    /// Root issue number in --issue-owner/--issue-repo (repeatable)
    #[arg(short = 'n', long = "issue-number", global = true)]
    issue_numbers: Vec<u64>,

    /// TOML file with default settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging (can be repeated for more detail: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Render the task graph as a Mermaid flowchart.
    Mermaid {
        /// Graph direction (TB or LR)
        #[arg(short, long)]
        dir: Option<String>,

        /// Wrap the diagram in an HTML page
        #[arg(short, long)]
        browser: bool,

        /// Wrap the diagram in a ```mermaid fence
        #[arg(short, long)]
        fence: bool,

        /// Do not follow references out of closed issues
        #[arg(short = 'c', long)]
        skip_closed: bool,
    },

    /// Print the nodes and edges of the task graph.
    List {
        /// Do not follow references out of closed issues
        #[arg(short = 'c', long)]
        skip_closed: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let dispatch = init_tracing(cli.verbose, cli.quiet);
    let logger = if cli.verbose > 0 {
        Logger::new(dispatch)
    } else {
        Logger::discard()
    };

    let file_config = match &cli.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let roots = resolve_roots(&cli)?;

    match &cli.command {
        Command::Mermaid {
            dir,
            browser,
            fence,
            skip_closed,
        } => {
            let direction = dir
                .as_deref()
                .or(file_config.direction.as_deref())
                .unwrap_or("TB")
                .to_uppercase();
            let skip_closed = *skip_closed || file_config.skip_closed.unwrap_or(false);

            let graph = accumulate(&cli, &file_config, logger, skip_closed, &roots).await?;
            let diagram = render(&graph, &direction).context("Failed to render task graph")?;
            let wrapping = if *browser {
                Wrapping::Html
            } else if *fence {
                Wrapping::Fence
            } else {
                Wrapping::None
            };
            write_stdout(&wrap(&diagram, wrapping))
        }
        Command::List { skip_closed } => {
            let skip_closed = *skip_closed || file_config.skip_closed.unwrap_or(false);
            let graph = accumulate(&cli, &file_config, logger, skip_closed, &roots).await?;
            write_stdout(&list_graph(&graph))
        }
    }
}

fn init_tracing(verbose: u8, quiet: bool) -> Dispatch {
    let filter = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .without_time()
        .finish();
    let dispatch = Dispatch::new(subscriber);
    let _ = tracing::dispatcher::set_global_default(dispatch.clone());
    dispatch
}

/// Collect the root references named on the command line.
///
/// `--issue` values are parsed in short form; a bare `#n` takes its owner
/// and repository from `--issue-owner`/`--issue-repo`. `--issue-number`
/// values always live there and default to `1` when no `--issue` is given.
fn resolve_roots(cli: &Cli) -> Result<Vec<IssueRef>> {
    let defaults = IssueRef::new(
        cli.issue_owner.clone().unwrap_or_default(),
        cli.issue_repo.clone().unwrap_or_default(),
        0,
    );

    let mut roots = Vec::new();
    for raw in &cli.issues {
        let reference = parse_short(raw.trim())
            .with_context(|| format!("Invalid --issue value: {raw}"))?
            .inherit_from(&defaults);
        if !reference.is_qualified() {
            bail!("--issue {raw} needs --issue-owner and --issue-repo");
        }
        roots.push(reference);
    }

    let numbers = if cli.issue_numbers.is_empty() && cli.issues.is_empty() {
        vec![1]
    } else {
        cli.issue_numbers.clone()
    };
    for number in numbers {
        if !defaults.is_qualified() {
            bail!("--issue-number needs --issue-owner and --issue-repo");
        }
        if number == 0 {
            bail!("issue numbers start at 1");
        }
        roots.push(IssueRef::new(
            defaults.owner.clone(),
            defaults.repo.clone(),
            number,
        ));
    }

    debug!("root issues: {roots:?}");
    Ok(roots)
}

async fn accumulate(
    cli: &Cli,
    file_config: &FileConfig,
    logger: Logger,
    skip_closed: bool,
    roots: &[IssueRef],
) -> Result<TaskGraph> {
    let token_path = cli
        .access_token
        .as_deref()
        .or(file_config.access_token.as_deref())
        .unwrap_or(DEFAULT_TOKEN_PATH);
    let token = load_access_token(token_path).context("Failed to load GitHub access token")?;

    let mut github = GitHubConfig::default();
    if let Some(api_base) = &file_config.api_base {
        github = github.with_api_base(api_base.clone());
    }
    if let Some(seconds) = file_config.timeout_secs {
        github = github.with_timeout(Duration::from_secs(seconds));
    }
    let client = GitHubClient::new(&token, github).context("Failed to create GitHub client")?;

    let mut config = AccumulateConfig::default().with_skip_closed(skip_closed);
    if let Some(max_in_flight) = file_config.max_in_flight {
        config = config.with_max_in_flight(max_in_flight);
    }

    Accumulator::new(Arc::new(client))
        .with_config(config)
        .with_logger(logger)
        .accumulate(roots)
        .await
        .context("Failed to accumulate task graph")
}

fn list_graph(graph: &TaskGraph) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "nodes: {}", graph.node_count());
    let _ = writeln!(output, "edges: {}", graph.edge_count());
    for (identity, handle) in &graph.nodes {
        let _ = writeln!(output, "{identity} {}", handle.issue.title);
    }
    for (identity, targets) in &graph.edges {
        for target in targets {
            let _ = writeln!(output, "{identity} -> {target}");
        }
    }
    output
}

fn write_stdout(content: &str) -> Result<()> {
    io::stdout()
        .write_all(content.as_bytes())
        .context("Failed to write to stdout")
}
