//! Block translator command line entry point.
//!
//! Resolves block numbers emitted by contracts into the local block ranges to scan for
//! their events, using the translation strategy of the selected network.
//!
//! # Flow
//! 1. Loads network configurations (default `config/networks/`)
//! 2. Connects to the selected network and builds its translator
//! 3. With `--block`, prints one JSON line per resolved range and exits
//! 4. Without `--block`, keeps the translator cache in sync with new heads until Ctrl+C

pub mod bootstrap;
pub mod models;
pub mod repositories;
pub mod services;
pub mod utils;

use crate::{
	bootstrap::{initialize_network_service, initialize_translator, Result},
	services::translator::QueryContext,
	utils::{
		logging::setup_logging,
		parsing::{parse_block_number, parse_string_to_bytes_size},
	},
};

use alloy::primitives::U256;
use clap::Parser;
use dotenvy::dotenv_override;
use futures::future::try_join_all;
use serde::Serialize;
use std::{
	env::{set_var, var},
	path::PathBuf,
	time::Duration,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[derive(Parser)]
#[command(
	name = "evm-block-translator",
	about = "Translates block numbers recorded by contracts into the local block ranges holding their events.",
	version
)]
struct Cli {
	/// Write logs to file instead of stdout
	#[arg(long)]
	log_file: bool,

	/// Set log level (trace, debug, info, warn, error)
	#[arg(long, value_name = "LEVEL")]
	log_level: Option<String>,

	/// Path to store log files (default: logs/)
	#[arg(long, value_name = "PATH")]
	log_path: Option<String>,

	/// Maximum log file size before rolling (e.g., "1GB", "500MB", "1024KB")
	#[arg(long, value_name = "SIZE", value_parser = parse_string_to_bytes_size)]
	log_max_size: Option<u64>,

	/// Directory holding the network configuration files
	#[arg(long, value_name = "PATH")]
	config_dir: Option<PathBuf>,

	/// Slug of the network to translate for
	#[arg(long, value_name = "NETWORK_SLUG")]
	network: Option<String>,

	/// Emitted block number to resolve, decimal or 0x-prefixed hex; repeatable
	#[arg(long = "block", value_name = "BLOCK_NUMBER", value_parser = parse_block_number)]
	blocks: Vec<U256>,

	/// Deadline in milliseconds for resolving all requested blocks
	#[arg(long, value_name = "MS")]
	timeout_ms: Option<u64>,

	/// Validate configuration files without connecting to any network
	#[arg(long)]
	check: bool,
}

impl Cli {
	/// Apply CLI options to environment variables, overriding any existing values
	fn apply_to_env(&self) {
		dotenv_override().ok();

		if self.log_file {
			set_var("LOG_MODE", "file");
		}

		if let Ok(level) = var("RUST_LOG") {
			set_var("LOG_LEVEL", level);
		}

		if let Some(level) = &self.log_level {
			set_var("LOG_LEVEL", level);
			set_var("RUST_LOG", level);
		}

		if let Some(path) = &self.log_path {
			set_var("LOG_DATA_DIR", path);
		}

		if let Some(max_size) = &self.log_max_size {
			set_var("LOG_MAX_SIZE", max_size.to_string());
		}
	}
}

/// One resolved emitted block number
#[derive(Debug, Serialize)]
struct TranslationOutput {
	network: String,
	strategy: String,
	emitted: String,
	from: String,
	to: String,
}

#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();
	cli.apply_to_env();

	setup_logging().unwrap_or_else(|e| {
		error!("Failed to setup logging: {}", e);
	});

	let network_service = initialize_network_service(cli.config_dir.as_deref()).await?;

	if cli.check {
		let mut slugs: Vec<String> = network_service.get_all().into_keys().collect();
		slugs.sort();
		info!(networks = ?slugs, "✓ Configuration validation completed successfully");
		return Ok(());
	}

	let slug = cli
		.network
		.clone()
		.ok_or("--network is required unless --check is given")?;
	let network = network_service.require(&slug)?;
	let runtime = initialize_translator(&network).await?;

	let cancel = CancellationToken::new();
	let watcher_handle = runtime.start(cancel.clone());

	if cli.blocks.is_empty() {
		if watcher_handle.is_none() {
			info!(network = %slug, "Translator keeps no chain state, nothing to watch");
			return Ok(());
		}
		info!("Service started. Press Ctrl+C to shutdown");
		if let Err(e) = tokio::signal::ctrl_c().await {
			error!("Error waiting for Ctrl+C: {}", e);
		}
		info!("Shutdown signal received, stopping services...");
	} else {
		let strategy = runtime.translator.kind().to_string();
		let ctx = match cli.timeout_ms {
			Some(ms) => QueryContext::new().with_timeout(Duration::from_millis(ms)),
			None => QueryContext::new(),
		};
		let ranges = try_join_all(
			cli.blocks
				.iter()
				.map(|&emitted| runtime.translate(&ctx, emitted)),
		)
		.await?;

		for (emitted, range) in cli.blocks.iter().zip(ranges) {
			let output = TranslationOutput {
				network: slug.clone(),
				strategy: strategy.clone(),
				emitted: emitted.to_string(),
				from: range.from.to_string(),
				to: range.to.to_string(),
			};
			println!("{}", serde_json::to_string(&output)?);
		}
	}

	cancel.cancel();
	if let Some(handle) = watcher_handle {
		if let Err(e) = handle.await {
			error!("Head watcher task failed: {}", e);
		}
	}

	Ok(())
}
