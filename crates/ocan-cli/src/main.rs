// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
//! `ocan` — run the gateway, inspect a registry, or replay a captured
//! chain against a local target for debugging (§4.D of `SPEC_FULL.md`).

mod commands;
mod demo;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ocan", version, about = "OCAN RPC toolkit CLI")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging.
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the gateway's axum server.
    Serve {
        /// Path to a TOML config file. Falls back to defaults when absent.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the configured bind address.
        #[arg(long)]
        bind: Option<String>,
    },
    /// Inspect a registry of live actor instances.
    Registry {
        #[command(subcommand)]
        command: RegistryCommand,
    },
    /// Decode a captured operation chain and replay it against an
    /// in-process demo target, printing the result.
    Replay {
        /// Path to a JSON file holding one codec-encoded document whose
        /// root is an operation chain.
        chain_file: PathBuf,

        /// Binding name the target is registered under.
        #[arg(long, default_value = "counters")]
        binding: String,

        /// Instance name within that binding.
        #[arg(long, default_value = "demo")]
        instance: String,
    },
}

#[derive(Subcommand, Debug)]
enum RegistryCommand {
    /// List registered instances, optionally filtered to one binding.
    List {
        /// Restrict the listing to this binding.
        #[arg(long)]
        binding: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.debug {
        EnvFilter::new("ocan=debug")
    } else {
        EnvFilter::new("ocan=info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Command::Serve { config, bind } => serve(config, bind),
        Command::Registry { command: RegistryCommand::List { binding } } => {
            registry_list(binding.as_deref())
        }
        Command::Replay { chain_file, binding, instance } => {
            replay(&chain_file, &binding, &instance)
        }
    }
}

fn serve(config_path: Option<PathBuf>, bind_override: Option<String>) -> Result<()> {
    let mut config = ocan_config::load_config(config_path.as_deref()).context("load gateway config")?;
    if let Some(bind) = bind_override {
        config.bind_address = bind;
    }
    let warnings = ocan_config::validate_config(&config).context("validate gateway config")?;
    for warning in &warnings {
        tracing::warn!(%warning, "config warning");
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("build tokio runtime")?;

    runtime.block_on(async move {
        let bind_address = config.bind_address.clone();
        let state = ocan_gateway::GatewayState::spawn(demo::demo_registry, config);
        let router = ocan_gateway::build_router(state);

        let listener = tokio::net::TcpListener::bind(&bind_address)
            .await
            .with_context(|| format!("bind {bind_address}"))?;
        tracing::info!(bind = %bind_address, "ocan gateway listening");
        axum::serve(listener, router).await.context("serve")
    })
}

fn registry_list(binding: Option<&str>) -> Result<()> {
    let registry = demo::demo_registry();
    for entry in commands::list_instances(&registry, binding) {
        println!("{}/{}", entry.binding_name, entry.instance_name);
    }
    Ok(())
}

fn replay(chain_file: &PathBuf, binding: &str, instance: &str) -> Result<()> {
    let output = commands::replay_file(chain_file, binding, instance)?;
    println!("{output}");
    Ok(())
}
