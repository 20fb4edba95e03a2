//! Loading and validation of JSON configuration files.
//!
//! Each configurable type implements [`ConfigLoader`]; network definitions live in
//! `config/networks/` by default.

#![allow(clippy::result_large_err)]

use async_trait::async_trait;
use std::path::Path;

mod error;
mod network_config;

pub use error::ConfigError;

/// Common interface for loading configuration files
#[async_trait]
pub trait ConfigLoader: Sized {
	/// Loads every JSON file of a directory, keyed by file stem.
	///
	/// Falls back to the default directory of the type when `path` is `None`.
	async fn load_all<T>(path: Option<&Path>) -> Result<T, ConfigError>
	where
		T: FromIterator<(String, Self)>;

	/// Loads, resolves and validates a single file.
	async fn load_from_path(path: &Path) -> Result<Self, ConfigError>;

	fn validate(&self) -> Result<(), ConfigError>;

	/// Warns about insecure transport settings without failing.
	fn validate_protocol(&self);

	fn is_json_file(path: &Path) -> bool {
		path.extension()
			.map(|ext| ext.eq_ignore_ascii_case("json"))
			.unwrap_or(false)
	}

	/// Returns a copy with every secret replaced by its plain value.
	async fn resolve_secrets(&self) -> Result<Self, ConfigError>;

	/// Fails when `current_instance` shares an identifying field with one of `instances`.
	///
	/// `file_path` only appears in the error metadata.
	fn validate_uniqueness(
		instances: &[&Self],
		current_instance: &Self,
		file_path: &str,
	) -> Result<(), ConfigError>;
}
