//! Network configuration repository.
//!
//! Networks are loaded from one directory of JSON files and served by slug.

#![allow(clippy::result_large_err)]

use std::{collections::HashMap, path::Path};

use async_trait::async_trait;
use tracing::info;

use crate::{
	models::{ConfigLoader, Network},
	repositories::error::RepositoryError,
};

/// In-memory set of validated networks, keyed by slug
#[derive(Clone)]
pub struct NetworkRepository {
	pub networks: HashMap<String, Network>,
}

impl NetworkRepository {
	/// Loads every network of `path`, or of `config/networks` when `None`
	pub async fn new(path: Option<&Path>) -> Result<Self, RepositoryError> {
		let networks = Self::load_all(path).await?;
		info!(count = networks.len(), "Loaded network configurations");
		Ok(NetworkRepository { networks })
	}
}

#[async_trait]
pub trait NetworkRepositoryTrait: Clone {
	async fn new(path: Option<&Path>) -> Result<Self, RepositoryError>
	where
		Self: Sized;

	/// Loads and validates every network file, keyed by network slug
	async fn load_all(path: Option<&Path>) -> Result<HashMap<String, Network>, RepositoryError>;

	fn get(&self, slug: &str) -> Option<Network>;

	fn get_all(&self) -> HashMap<String, Network>;
}

#[async_trait]
impl NetworkRepositoryTrait for NetworkRepository {
	async fn new(path: Option<&Path>) -> Result<Self, RepositoryError> {
		NetworkRepository::new(path).await
	}

	async fn load_all(path: Option<&Path>) -> Result<HashMap<String, Network>, RepositoryError> {
		let by_file: Vec<(String, Network)> = Network::load_all(path).await.map_err(|e| {
			RepositoryError::load_error(
				"Failed to load networks",
				Some(Box::new(e)),
				Some(HashMap::from([(
					"path".to_string(),
					path.map_or_else(|| "default".to_string(), |p| p.display().to_string()),
				)])),
			)
		})?;

		Ok(by_file
			.into_iter()
			.map(|(_, network)| (network.slug.clone(), network))
			.collect())
	}

	fn get(&self, slug: &str) -> Option<Network> {
		self.networks.get(slug).cloned()
	}

	fn get_all(&self) -> HashMap<String, Network> {
		self.networks.clone()
	}
}

/// Access to network configurations through a repository implementation
#[derive(Clone)]
pub struct NetworkService<T: NetworkRepositoryTrait> {
	repository: T,
}

impl<T: NetworkRepositoryTrait> NetworkService<T> {
	pub async fn new(
		path: Option<&Path>,
	) -> Result<NetworkService<NetworkRepository>, RepositoryError> {
		let repository = NetworkRepository::new(path).await?;
		Ok(NetworkService { repository })
	}

	pub fn new_with_repository(repository: T) -> Result<Self, RepositoryError> {
		Ok(NetworkService { repository })
	}

	pub fn get(&self, slug: &str) -> Option<Network> {
		self.repository.get(slug)
	}

	/// Like [`Self::get`], but a missing network is an error naming the known slugs
	pub fn require(&self, slug: &str) -> Result<Network, RepositoryError> {
		self.get(slug).ok_or_else(|| {
			let mut known: Vec<String> = self.repository.get_all().into_keys().collect();
			known.sort();
			RepositoryError::validation_error(
				format!("Network '{}' not found", slug),
				None,
				Some(HashMap::from([("available".to_string(), known.join(","))])),
			)
		})
	}

	pub fn get_all(&self) -> HashMap<String, Network> {
		self.repository.get_all()
	}
}
