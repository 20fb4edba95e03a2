//! Parsers for command line values.

use alloy::primitives::U256;
use byte_unit::Byte;
use std::str::FromStr;

/// Parses a human-readable size such as "1GB", "500MB" or "1024KiB" into bytes.
pub fn parse_string_to_bytes_size(s: &str) -> Result<u64, String> {
	match Byte::from_str(s) {
		Ok(byte) => Ok(byte.as_u64()),
		Err(e) => Err(format!("Invalid size format: '{}'. Error: {}", s, e)),
	}
}

/// Parses a block number given in decimal or as a `0x` prefixed hex quantity.
pub fn parse_block_number(s: &str) -> Result<U256, String> {
	let trimmed = s.trim();
	if trimmed.is_empty() {
		return Err("Invalid block number: empty value".to_string());
	}
	let parsed = match trimmed
		.strip_prefix("0x")
		.or_else(|| trimmed.strip_prefix("0X"))
	{
		Some(hex) if !hex.is_empty() => U256::from_str_radix(hex, 16),
		Some(_) => return Err(format!("Invalid block number: '{}'", s)),
		None => U256::from_str_radix(trimmed, 10),
	};
	parsed.map_err(|e| format!("Invalid block number: '{}'. Error: {}", s, e))
}
