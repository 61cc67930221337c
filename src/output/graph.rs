//! Node/edge view of a crawl
//!
//! Nodes are normalized URLs: every crawled page plus every normalized link target, even
//! targets that were never fetched (other hosts, pages past the budget). Links are the
//! distinct (page, target) pairs.

use crate::crawler::PageRecord;
use crate::url::normalize_url;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A graph node, identified by its normalized URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
}

/// A directed edge between two normalized URLs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphLink {
    pub source: String,
    pub target: String,
}

/// Graph form of a crawl result
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlGraph {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
}

/// Builds the graph for a crawl result
///
/// Link targets that cannot be normalized (`mailto:`, `javascript:`) are left out.
/// Nodes and links come out sorted.
pub fn build_graph(pages: &BTreeMap<String, PageRecord>) -> CrawlGraph {
    let mut nodes: BTreeSet<String> = pages.keys().cloned().collect();
    let mut links: BTreeSet<(String, String)> = BTreeSet::new();

    for (source, page) in pages {
        for target in page.outgoing_links.iter().filter_map(|l| normalize_url(l).ok()) {
            nodes.insert(target.clone());
            links.insert((source.clone(), target));
        }
    }

    CrawlGraph {
        nodes: nodes.into_iter().map(|id| GraphNode { id }).collect(),
        links: links
            .into_iter()
            .map(|(source, target)| GraphLink { source, target })
            .collect(),
    }
}
