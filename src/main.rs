// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! mcp-explorer entry point - CLI, commands, and the interactive explorer.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;

use mcp_explorer::cli::commands::{self, ConnectOptions};
use mcp_explorer::cli::{render, ConnectTarget, Explorer, OutputFormat};
use mcp_explorer::config::{self, CliOptions, ResolvedConfig};
use mcp_explorer::telemetry::{init_telemetry, TelemetryConfig, GLOBAL_METRICS};
use mcp_explorer::{Protocol, ServerDescriptor, VERSION};

/// Explore Model Context Protocol servers.
#[derive(Parser)]
#[command(name = "mcp-explorer")]
#[command(author, version, about = "Explore Model Context Protocol servers", long_about = None)]
struct Cli {
    /// Server registry file
    #[arg(short, long, global = true, env = "MCP_EXPLORER_REGISTRY")]
    registry: Option<PathBuf>,

    /// Seconds allowed for a stdio server to start
    #[arg(long, global = true)]
    startup_timeout: Option<u64>,

    /// Seconds allowed for each stdio request
    #[arg(long, global = true)]
    request_timeout: Option<u64>,

    /// Seconds allowed for each HTTP request
    #[arg(long, global = true)]
    http_timeout: Option<u64>,

    /// Never launch a stdio server implicitly
    #[arg(long, global = true)]
    no_auto_open: bool,

    /// Suppress spinners
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Print operation metrics on exit
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Show debug output
    #[arg(long, global = true)]
    debug: bool,

    /// Show trace output (full payloads)
    #[arg(long, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Subcommands for mcp-explorer.
#[derive(Subcommand)]
enum Commands {
    /// Manage registered servers
    Servers {
        #[command(subcommand)]
        action: ServersAction,
    },

    /// Connect to a server, show its info and tools, then disconnect
    Connect {
        #[command(flatten)]
        target: TargetArgs,

        /// Server script (.py or .js) to launch instead of the configured program
        #[arg(long)]
        script: Option<PathBuf>,

        /// Export tools as JSON (defaults to the configured export path)
        #[arg(long, value_name = "FILE")]
        export: Option<Option<PathBuf>>,
    },

    /// Interactive explorer (default)
    Explore,

    /// Show or create configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },

    /// Show version information
    Version,
}

/// Server selection flags.
#[derive(Args)]
struct TargetArgs {
    /// Registered server name
    name: Option<String>,

    /// HTTP server URL
    #[arg(long, conflicts_with_all = ["command", "program"])]
    url: Option<String>,

    /// Stdio launcher command, e.g. "uv run" or "node"
    #[arg(long, requires = "program")]
    command: Option<String>,

    /// Stdio server program, passed as the last launcher argument
    #[arg(long, requires = "command")]
    program: Option<String>,
}

impl From<TargetArgs> for ConnectTarget {
    fn from(args: TargetArgs) -> Self {
        Self {
            name: args.name,
            url: args.url,
            command: args.command,
            program: args.program,
        }
    }
}

/// Servers subcommand actions.
#[derive(Subcommand)]
enum ServersAction {
    /// List registered servers
    #[command(alias = "ls")]
    List {
        /// Only show servers using this protocol (http or stdio)
        #[arg(long)]
        protocol: Option<Protocol>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Register a server, replacing any server with the same name
    Add {
        name: String,

        /// HTTP server URL
        #[arg(long, required_unless_present = "command", conflicts_with_all = ["command", "program"])]
        url: Option<String>,

        /// Stdio launcher command
        #[arg(long, requires = "program")]
        command: Option<String>,

        /// Stdio server program
        #[arg(long, requires = "command")]
        program: Option<String>,
    },

    /// Remove a registered server
    #[command(alias = "rm")]
    Remove { name: String },
}

/// Config subcommand actions.
#[derive(Subcommand)]
enum ConfigAction {
    /// Show resolved configuration
    Show,

    /// Write a default .mcp-explorer.json in the current directory
    Init,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let _guard = init_tracing(&cli);
    let verbose = cli.verbose;

    let result = run(cli).await;

    if verbose {
        eprintln!("\n{}", GLOBAL_METRICS.snapshot().format_report().dimmed());
    }

    if let Err(err) = result {
        render::print_failure(&err);
        std::process::exit(1);
    }
}

fn init_tracing(cli: &Cli) -> Option<mcp_explorer::telemetry::TelemetryGuard> {
    let config = if cli.trace {
        TelemetryConfig::development().with_filter("mcp_explorer=trace")
    } else if cli.debug {
        TelemetryConfig::development()
    } else {
        TelemetryConfig::default()
    };

    // Only fails if a subscriber is already installed.
    init_telemetry(&config).ok()
}

fn load_config(cli: &Cli) -> anyhow::Result<ResolvedConfig> {
    let cli_options = CliOptions {
        registry_path: cli.registry.clone(),
        export_path: None,
        startup_timeout_sec: cli.startup_timeout,
        request_timeout_sec: cli.request_timeout,
        http_timeout_sec: cli.http_timeout,
        no_auto_open: cli.no_auto_open,
    };

    let workspace_root = std::env::current_dir()?;
    Ok(config::load_config(&workspace_root, cli_options)?)
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let quiet = cli.quiet;
    let config = load_config(&cli)?;

    match cli.command.unwrap_or(Commands::Explore) {
        Commands::Servers { action } => match action {
            ServersAction::List { protocol, format } => commands::servers_list(&config, protocol, format)?,
            ServersAction::Add {
                name,
                url,
                command,
                program,
            } => {
                let descriptor = match (url, command, program) {
                    (Some(url), _, _) => ServerDescriptor::http(name, url),
                    (None, Some(command), Some(program)) => ServerDescriptor::stdio(name, command, program),
                    _ => anyhow::bail!("Specify --url, or --command with --program"),
                };
                commands::servers_add(&config, descriptor)?;
            }
            ServersAction::Remove { name } => commands::servers_remove(&config, &name)?,
        },
        Commands::Connect { target, script, export } => {
            let opts = ConnectOptions {
                script,
                export: export.map(|path| path.unwrap_or_else(|| config.export_path.clone())),
                quiet,
            };
            commands::connect(&config, &target.into(), &opts).await?;
        }
        Commands::Explore => Explorer::new(config, quiet).run().await?,
        Commands::Config { action } => match action {
            Some(ConfigAction::Show) | None => {
                println!("{}", serde_json::to_string_pretty(&config)?);
            }
            Some(ConfigAction::Init) => {
                let path = config::init_config(&std::env::current_dir()?)?;
                println!("Created config file: {}", path.display());
            }
        },
        Commands::Version => {
            println!("mcp-explorer {}", VERSION);
        }
    }
    Ok(())
}
