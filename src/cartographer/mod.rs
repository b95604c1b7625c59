//! Phase 1: The Cartographer (Data Ingest)
//!
//! Pulls currencies, pairs and order books from EXMO and lays them out
//! as a dense rate graph.

mod exmo;
mod graph;

pub use exmo::{ExmoClient, MarketData, DEFAULT_CACHE_TTL_SECS, DEFAULT_TIMEOUT_SECS, EXMO_BASE_URL};
pub use graph::ArbitrageGraph;
