//! Output module for crawl reports
//!
//! This module handles:
//! - Writing the CSV page report
//! - Reshaping crawl results into a node/edge graph
//! - Summarizing crawl statistics

mod csv_report;
mod graph;
pub mod stats;

pub use csv_report::{format_csv_report, write_csv_report, CSV_HEADERS};
pub use graph::{build_graph, CrawlGraph, GraphLink, GraphNode};
pub use stats::{print_statistics, CrawlStatistics};

use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
