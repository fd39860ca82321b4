//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Shared utilities (config loading, CSV loading)
//! - `forecast` - Next-period and multi-period forecasts
//! - `reports` - Dataset summary
//! - `serve` - Web server command

pub mod core;
pub mod forecast;
pub mod reports;
pub mod serve;

// Re-export command functions for main.rs
pub use core::*;
pub use forecast::*;
pub use reports::*;
pub use serve::*;
