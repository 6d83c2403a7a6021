//! Playground CLI entry point.
//!
//! Runs the HTTP execution service, executes source files directly, or
//! drives the interactive playground session against either backend.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, AsyncReadExt};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use playground_client::{
    ExecutionBackend, LocalBackend, PlaygroundController, RemoteBackend, ResultField,
};
use playground_common::{BackendConfig, ConfigFile};
use playground_runtime::RuntimeLoader;
use playground_server::{AppState, PlaygroundServer, ServerConfig};

#[derive(Parser)]
#[command(name = "playground", version, about = "Wasm-backed code playground")]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(long, short, env = "PLAYGROUND_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP execution service (requires a local backend).
    Serve {
        /// Override the configured bind address.
        #[arg(long)]
        bind: Option<String>,
    },
    /// Execute a source file (or stdin) and print its output.
    Run {
        /// Source file to execute; reads stdin when omitted.
        file: Option<PathBuf>,
    },
    /// List the available examples.
    Examples,
    /// Interactive playground session.
    Repl,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,playground=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ConfigFile::from_file(path)
            .with_context(|| format!("Failed to load config from '{}'", path.display()))?,
        None => ConfigFile::default(),
    };

    match cli.command {
        Command::Serve { bind } => serve(config, bind).await,
        Command::Run { file } => run(config, file).await,
        Command::Examples => examples(config).await,
        Command::Repl => repl(config).await,
    }
}

/// Run the HTTP execution service over a locally loaded runtime.
async fn serve(config: ConfigFile, bind: Option<String>) -> anyhow::Result<()> {
    let BackendConfig::Local(local) = &config.backend else {
        anyhow::bail!("the serve command requires a local backend (backend.mode = \"local\")");
    };

    let loader = RuntimeLoader::new(&config.runtime)?;
    let runtime = loader
        .load(&local.module_path)
        .await
        .with_context(|| format!("Failed to load module '{}'", local.module_path))?;

    let state = AppState::new(runtime, &config.examples, &config.runtime);

    let bind_addr = bind
        .unwrap_or_else(|| config.server.bind_addr.clone())
        .parse()
        .context("Invalid bind address. Expected format: 'host:port' (e.g., '0.0.0.0:3826')")?;

    let mut server_config = ServerConfig::default()
        .with_bind_addr(bind_addr)
        .with_timeout(config.server.request_timeout_secs);
    server_config.graceful_shutdown = config.server.graceful_shutdown;

    info!(bind_addr = %bind_addr, "Configuration loaded");
    info!("Server initialized. Available endpoints:");
    info!("  GET  /health              - Health check");
    info!("  GET  /v1/examples         - List examples");
    info!("  GET  /v1/examples/:name   - Fetch example source");
    info!("  POST /v1/execute          - Execute source");

    PlaygroundServer::new(state, server_config).run().await?;

    Ok(())
}

/// Build the execution backend the configuration selects.
async fn build_backend(config: &ConfigFile) -> anyhow::Result<Arc<dyn ExecutionBackend>> {
    match &config.backend {
        BackendConfig::Local(local) => {
            let loader = RuntimeLoader::new(&config.runtime)?;
            let handle = loader.handle();
            loader
                .load(&local.module_path)
                .await
                .with_context(|| format!("Failed to load module '{}'", local.module_path))?;
            Ok(Arc::new(LocalBackend::new(handle)))
        }
        BackendConfig::Remote(remote) => Ok(Arc::new(RemoteBackend::new(remote)?)),
    }
}

/// Execute one source text and print the output.
async fn run(config: ConfigFile, file: Option<PathBuf>) -> anyhow::Result<()> {
    let source = match &file {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read '{}'", path.display()))?,
        None => {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .context("Failed to read stdin")?;
            buf
        }
    };

    let backend = build_backend(&config).await?;
    let outcome = backend.run(&source).await?;

    print!("{}", outcome.output);
    if !outcome.succeeded {
        std::process::exit(1);
    }
    Ok(())
}

/// List the available examples in display order.
async fn examples(config: ConfigFile) -> anyhow::Result<()> {
    let backend = build_backend(&config).await?;

    let mut ids = backend.list_examples().await?;
    ids.sort();
    for id in ids {
        println!("{id}");
    }
    Ok(())
}

/// Interactive session driven through the playground controller.
async fn repl(config: ConfigFile) -> anyhow::Result<()> {
    let backend = build_backend(&config).await?;
    let ctrl = PlaygroundController::new(backend);
    ctrl.init().await;
    drain_notices(&ctrl);

    println!("playground repl - :examples, :load <id>, :run, :quit");
    if let Some(id) = ctrl.selected() {
        println!("loaded example '{id}'");
    }

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        match line {
            ":quit" => break,
            ":examples" => {
                for id in ctrl.catalog() {
                    println!("{id}");
                }
            }
            ":run" => {
                ctrl.submit().await;
                match ctrl.result() {
                    ResultField::Shown { text, succeeded } => {
                        let tag = if succeeded { "ok" } else { "error" };
                        println!("[{tag}] {text}");
                    }
                    ResultField::Waiting => println!("[pending] Waiting..."),
                    ResultField::Idle => {}
                }
            }
            _ if line.starts_with(":load ") => {
                let id = line.trim_start_matches(":load ").trim();
                ctrl.select(id).await;
                println!("{}", ctrl.source().text());
            }
            "" => {}
            _ => ctrl.set_source(line),
        }
        drain_notices(&ctrl);
    }

    Ok(())
}

fn drain_notices(ctrl: &PlaygroundController) {
    while let Some(notice) = ctrl.take_notice() {
        eprintln!("notice: {notice}");
    }
}
