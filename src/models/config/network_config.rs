//! Network configuration loading and validation.
//!
//! Implements [`ConfigLoader`] for [`Network`] so network definitions can be read from
//! JSON files, one network per file.

use async_trait::async_trait;
use std::{collections::HashMap, path::Path};

use crate::models::{config::error::ConfigError, ChainType, ConfigLoader, Network, SecretValue};

const DEFAULT_NETWORKS_DIR: &str = "config/networks";

/// Comparison key for names and slugs: case and whitespace are ignored
fn normalize_identifier(value: &str) -> String {
	value
		.chars()
		.filter(|c| !c.is_whitespace())
		.collect::<String>()
		.to_lowercase()
}

fn path_metadata(path: &Path) -> Option<HashMap<String, String>> {
	Some(HashMap::from([(
		"path".to_string(),
		path.display().to_string(),
	)]))
}

#[async_trait]
impl ConfigLoader for Network {
	async fn resolve_secrets(&self) -> Result<Self, ConfigError> {
		dotenvy::dotenv().ok();
		let mut network = self.clone();

		for rpc_url in &mut network.rpc_urls {
			let resolved = rpc_url.url.resolve().map_err(|e| {
				ConfigError::parse_error(
					format!("failed to resolve RPC URL: {}", e),
					Some(e),
					Some(HashMap::from([("network".to_string(), self.slug.clone())])),
				)
			})?;
			rpc_url.url = SecretValue::Plain(resolved);
		}
		Ok(network)
	}

	async fn load_all<T>(path: Option<&Path>) -> Result<T, ConfigError>
	where
		T: FromIterator<(String, Self)>,
	{
		let network_dir = path.unwrap_or(Path::new(DEFAULT_NETWORKS_DIR));

		if !network_dir.exists() {
			return Err(ConfigError::file_error(
				"networks directory not found",
				None,
				path_metadata(network_dir),
			));
		}

		let entries = std::fs::read_dir(network_dir).map_err(|e| {
			ConfigError::file_error(
				format!("failed to read networks directory: {}", e),
				Some(Box::new(e)),
				path_metadata(network_dir),
			)
		})?;

		let mut paths = Vec::new();
		for entry in entries {
			let entry = entry.map_err(|e| {
				ConfigError::file_error(
					format!("failed to read directory entry: {}", e),
					Some(Box::new(e)),
					path_metadata(network_dir),
				)
			})?;
			let path = entry.path();
			if Self::is_json_file(&path) {
				paths.push(path);
			}
		}
		// read_dir order is platform dependent; duplicates must be reported deterministically
		paths.sort();

		let mut pairs: Vec<(String, Network)> = Vec::with_capacity(paths.len());
		for path in paths {
			let name = path
				.file_stem()
				.and_then(|s| s.to_str())
				.unwrap_or("unknown")
				.to_string();

			let network = Self::load_from_path(&path).await?;

			let existing: Vec<&Network> = pairs.iter().map(|(_, network)| network).collect();
			Self::validate_uniqueness(&existing, &network, &path.display().to_string())?;

			pairs.push((name, network));
		}

		Ok(T::from_iter(pairs))
	}

	async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
		let file = std::fs::File::open(path).map_err(|e| {
			ConfigError::file_error(
				format!("failed to open network config file: {}", e),
				Some(Box::new(e)),
				path_metadata(path),
			)
		})?;
		let config: Network = serde_json::from_reader(file).map_err(|e| {
			ConfigError::parse_error(
				format!("failed to parse network config: {}", e),
				Some(Box::new(e)),
				path_metadata(path),
			)
		})?;

		let config = config.resolve_secrets().await?;
		config.validate()?;

		Ok(config)
	}

	/// Checks names, RPC endpoints, timing and translator cache bounds.
	///
	/// Unknown chain types are accepted; the translator factory falls back to the identity
	/// strategy for them.
	fn validate(&self) -> Result<(), ConfigError> {
		let invalid = |msg: &str| {
			ConfigError::validation_error(
				msg,
				None,
				Some(HashMap::from([("network".to_string(), self.slug.clone())])),
			)
		};

		if self.name.trim().is_empty() {
			return Err(invalid("Network name is required"));
		}

		if self.slug.is_empty()
			|| !self
				.slug
				.chars()
				.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
		{
			return Err(invalid(
				"Slug must contain only lowercase letters, numbers, and underscores",
			));
		}

		if self.rpc_urls.is_empty() {
			return Err(invalid("At least one RPC URL is required"));
		}

		if !self.rpc_urls.iter().all(|rpc_url| rpc_url.type_ == "rpc") {
			return Err(invalid("RPC URL type must be one of: rpc"));
		}

		if !self.rpc_urls.iter().all(|rpc_url| {
			rpc_url.url.starts_with("http://") || rpc_url.url.starts_with("https://")
		}) {
			return Err(invalid("All RPC URLs must start with http:// or https://"));
		}

		if !self.rpc_urls.iter().all(|rpc_url| rpc_url.weight <= 100) {
			return Err(invalid("All RPC URL weights must be between 0 and 100"));
		}

		if self.block_time_ms < 100 {
			return Err(invalid("Block time must be at least 100ms"));
		}

		if self.max_reorg_depth == 0 {
			return Err(invalid("max_reorg_depth must be greater than 0"));
		}

		if self.translator.max_cached_ranges == 0 || self.translator.max_cached_probes == 0 {
			return Err(invalid("Translator cache sizes must be greater than 0"));
		}

		if self.translator.query_timeout_ms == Some(0) {
			return Err(invalid("query_timeout_ms must be greater than 0 when set"));
		}

		if let ChainType::Unknown(tag) = &self.chain_type {
			tracing::warn!(
				"Network '{}' has unrecognised chain_type '{}', block numbers will be used as-is",
				self.slug,
				tag
			);
		}

		self.validate_protocol();

		Ok(())
	}

	fn validate_protocol(&self) {
		for rpc_url in &self.rpc_urls {
			if rpc_url.url.starts_with("http://") {
				tracing::warn!(
					"Network '{}' uses an insecure RPC URL: {}",
					self.slug,
					rpc_url.url.as_str()
				);
			}
		}
	}

	fn validate_uniqueness(
		instances: &[&Self],
		current_instance: &Self,
		file_path: &str,
	) -> Result<(), ConfigError> {
		let fields: [(&str, fn(&Network) -> &str); 2] =
			[("name", |n| n.name.as_str()), ("slug", |n| n.slug.as_str())];

		for (field_name, field) in fields {
			let current = normalize_identifier(field(current_instance));
			if instances
				.iter()
				.any(|existing| normalize_identifier(field(existing)) == current)
			{
				return Err(ConfigError::validation_error(
					format!(
						"Duplicate network {} found: '{}'",
						field_name,
						field(current_instance)
					),
					None,
					Some(HashMap::from([
						(
							format!("network_{}", field_name),
							field(current_instance).to_string(),
						),
						("path".to_string(), file_path.to_string()),
					])),
				));
			}
		}
		Ok(())
	}
}
