//! MCP Server Entry Point
//!
//! Parses CLI flags to pick a transport and load configuration, then hands
//! off to the stdio or HTTP transport loop sharing one Protocol Dispatcher.

use std::path::PathBuf;

use clap::Parser;

use invoice_mcp_server::config::{ServerConfig, Transport};
use invoice_mcp_server::errors::ServerError;
use invoice_mcp_server::{core, tools, transport};

#[derive(Parser, Debug)]
#[command(name = "invoice-mcp-server", version, about = "MCP server exposing an invoice CLI as a tool catalog")]
struct Cli {
    /// Run the stdio transport (line-delimited JSON-RPC over stdin/stdout).
    #[arg(long, conflicts_with = "http")]
    stdio: bool,

    /// Run the HTTP transport.
    #[arg(long, conflicts_with = "stdio")]
    http: bool,

    /// HTTP bind port (only used with --http).
    #[arg(long)]
    port: Option<u16>,

    /// HTTP bind host (only used with --http).
    #[arg(long)]
    host: Option<String>,

    /// Path to an optional TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Build the tool registry, print a summary, and exit without serving.
    #[arg(long)]
    test: bool,

    /// Validate the tool/schema catalog for hygiene violations and exit.
    #[arg(long)]
    validate: bool,

    /// Print the registered tool catalog and exit.
    #[arg(long)]
    list_tools: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing();

    if let Err(e) = run(cli).await {
        tracing::error!(error = %e, "server exited with an error");
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<(), ServerError> {
    let mut server_config = ServerConfig::load(cli.config.as_ref())?;
    if cli.stdio {
        server_config.transport = Transport::Stdio;
    }
    if cli.http {
        server_config.transport = Transport::Http;
    }
    if let Some(host) = cli.host {
        server_config.host = host;
    }
    if let Some(port) = cli.port {
        server_config.port = port;
    }

    if cli.test || cli.validate || cli.list_tools {
        return run_diagnostics(&server_config, cli.validate, cli.list_tools);
    }

    let dispatcher = core::initialize(&server_config)?;

    match server_config.transport {
        Transport::Stdio => transport::stdio::run(dispatcher).await,
        Transport::Http => transport::http::run(dispatcher, server_config.host.clone(), server_config.port).await,
    }
}

fn run_diagnostics(config: &ServerConfig, validate: bool, list_tools: bool) -> Result<(), ServerError> {
    let registry = tools::build_registry()
        .map_err(|e| ServerError::Startup(format!("tool registry failed to build: {e:?}")))?;
    println!("registered {} tools", registry.len());

    if validate {
        let violations = core::schema::check_hygiene(&registry.schema_catalog());
        if violations.is_empty() {
            println!("schema catalog: no hygiene violations");
        } else {
            for v in &violations {
                println!("hygiene violation: {} {} — {}", v.tool, v.path, v.reason);
            }
            return Err(ServerError::Config(format!("{} schema hygiene violation(s)", violations.len())));
        }
    }

    if list_tools {
        for descriptor in registry.list(None) {
            println!("{:<24} [{}] {}", descriptor.name, descriptor.category.as_str(), descriptor.description);
        }
    }

    let _ = config;
    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};
    fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}
