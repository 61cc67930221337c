//! Configuration module
//!
//! This module handles loading, parsing, and validating the optional TOML configuration
//! file. Command-line arguments override the `[crawler]` values it provides.
//!
//! # Example
//!
//! ```no_run
//! use bald_stalker::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("stalker.toml")).unwrap();
//! println!("Crawler will claim at most {} pages", config.crawler.max_pages);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, OutputConfig, ServerConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;
