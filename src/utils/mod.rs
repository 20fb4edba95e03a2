//! Shared utilities.
//!
//! - http: retrying HTTP clients for JSON-RPC
//! - logging: subscriber setup and the error context used by every service error
//! - parsing: command line value parsers
//! - tests: builders and an in-memory chain for tests

pub mod http;
pub mod logging;
pub mod parsing;

pub use http::*;
pub use parsing::*;
