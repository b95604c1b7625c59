//! Phase 2: The Brain
//!
//! Responsible for:
//! - Max-product all-pairs paths (Floyd-Warshall under multiplication)
//! - Ranking every closable loop against the direct market price

mod floyd_warshall;
mod ranker;

pub use floyd_warshall::MaxProductSolver;
pub use ranker::OpportunityRanker;
