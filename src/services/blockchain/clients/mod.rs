//! Chain client implementations.

mod evm {
	pub mod client;
}

pub use evm::client::{EvmClient, EvmClientTrait};
