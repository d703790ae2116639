#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use output::{OutputMode, resolve_output_mode};
use refgraph_core::config::resolve_config;
use std::env;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "refgraph: resource reference cycle checks for Terraform export",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Emit JSON output (alias for `--format json`).
    #[arg(long, global = true, hide = true)]
    json: bool,

    /// Project config file to use instead of `.refgraph/config.toml`.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Leave out the built-in routing and telephony cycle rules.
    #[arg(long, global = true)]
    no_default_policy: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Validate",
        about = "Fail on reportable reference cycles",
        long_about = "Build the resource type graph from a registry manifest, classify every cycle, and exit non-zero when any cycle is reportable.",
        after_help = "EXAMPLES:\n    # Check a manifest\n    refgraph check registry.toml\n\n    # Ignore the built-in allow-list\n    refgraph check registry.toml --no-default-policy\n\n    # Emit machine-readable output\n    refgraph check registry.toml --format json"
    )]
    Check(cmd::check::CheckArgs),

    #[command(
        next_help_heading = "Inspect",
        about = "List reference cycles",
        long_about = "List reportable reference cycles, or every cycle with its class when --all is given.",
        after_help = "EXAMPLES:\n    # Reportable cycles only\n    refgraph cycles registry.toml\n\n    # Include ignored and excused cycles\n    refgraph cycles registry.toml --all"
    )]
    Cycles(cmd::cycles::CyclesArgs),

    #[command(
        next_help_heading = "Inspect",
        about = "Print the resource type graph",
        long_about = "Print the resource type dependency graph as a summary or Graphviz DOT.",
        after_help = "EXAMPLES:\n    # Summary\n    refgraph graph registry.toml\n\n    # Render with Graphviz\n    refgraph graph registry.toml --dot | dot -Tsvg > graph.svg"
    )]
    Graph(cmd::graph::GraphArgs),

    #[command(
        next_help_heading = "Project Maintenance",
        about = "Generate shell completion scripts",
        long_about = "Generate shell completion scripts for supported shells.",
        after_help = "EXAMPLES:\n    # Generate bash completions\n    refgraph completions bash\n\n    # Generate zsh completions\n    refgraph completions zsh"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("REFGRAPH_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "refgraph=debug,info"
        } else {
            "refgraph=info,warn"
        })
    });

    let format = env::var("REFGRAPH_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    if let Commands::Completions(args) = &cli.command {
        let mut command = Cli::command();
        return cmd::completions::run_completions(args.shell, &mut command);
    }

    let project_root = env::current_dir()?;
    let effective = resolve_config(&project_root, cli.config.as_deref(), cli.json)?;
    let output = resolve_output_mode(cli.format, &effective.resolved_output);
    debug!(?output, root = %project_root.display(), "configuration resolved");

    let ctx = cmd::CommandContext {
        output,
        project_root,
        config: effective.project,
        no_default_policy: cli.no_default_policy,
    };

    match &cli.command {
        Commands::Check(args) => cmd::check::run_check(args, &ctx),
        Commands::Cycles(args) => cmd::cycles::run_cycles(args, &ctx),
        Commands::Graph(args) => cmd::graph::run_graph(args, &ctx),
        Commands::Completions(_) => Ok(()),
    }
}
