//! precache - Offline pre-cache shim
//!
//! Pre-populates a named response cache from a fixed URL list at install
//! time and answers requests from it, falling back to the network.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod host;
pub mod http;
pub mod network;
pub mod worker;

pub use error::{PrecacheError, PrecacheResult};
