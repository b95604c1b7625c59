//! Opportunity Ranker
//!
//! Step 2.2: The Ranker
//!
//! Compares the best compounded rate `i -> j` against the direct market
//! price for the same leg and turns every realizable loop into an
//! `ArbitrageOpportunity`. Nothing is filtered out here: unprofitable
//! loops are ranked too, truncation is up to the caller.

use std::cmp::Ordering;
use tracing::{debug, warn};

use super::floyd_warshall::{ShortestPaths, EPSILON};
use crate::cartographer::ArbitrageGraph;
use crate::model::ArbitrageOpportunity;

pub struct OpportunityRanker<'a> {
    graph: &'a ArbitrageGraph,
    paths: &'a ShortestPaths,
}

impl<'a> OpportunityRanker<'a> {
    pub fn new(graph: &'a ArbitrageGraph, paths: &'a ShortestPaths) -> Self {
        Self { graph, paths }
    }

    /// Every closable loop, best first
    pub fn rank(&self) -> Vec<ArbitrageOpportunity> {
        let n = self.graph.node_count();
        let mut opportunities = Vec::new();

        for i in 0..n {
            for j in 0..n {
                // No direct trade between i and j: nothing closes the loop
                let Some(offer) = self.graph.direct_offer(i, j) else {
                    continue;
                };
                let Some(best) = self.paths.best(i, j) else {
                    continue;
                };

                let route: Option<Vec<_>> = self
                    .paths
                    .route(i, j)
                    .into_iter()
                    .map(|k| self.graph.currency(k).cloned())
                    .collect();
                let Some(route) = route else {
                    warn!("Skipping loop {} -> {}: route leaves the currency index", i, j);
                    continue;
                };

                let opportunity = ArbitrageOpportunity {
                    profit: best / offer,
                    route,
                };

                if !opportunity.is_valid() {
                    warn!(
                        "Skipping malformed loop {} (profit {})",
                        opportunity.format_route(),
                        opportunity.profit
                    );
                    continue;
                }

                opportunities.push(opportunity);
            }
        }

        sort_opportunities(&mut opportunities);

        debug!(
            "Ranked {} loops, {} above break-even",
            opportunities.len(),
            opportunities.iter().filter(|o| o.is_profitable()).count()
        );

        opportunities
    }
}

/// Descending by profit; profits within `EPSILON` of each other go
/// shortest route first.
///
/// Done in two passes (exact sort, then regroup) because an epsilon
/// comparator is not transitive and `sort_by` requires a total order.
pub fn sort_opportunities(opportunities: &mut [ArbitrageOpportunity]) {
    opportunities.sort_by(|a, b| b.profit.total_cmp(&a.profit));

    let mut start = 0;
    while start < opportunities.len() {
        let anchor = opportunities[start].profit;
        let end = opportunities[start..]
            .iter()
            .position(|o| (anchor - o.profit).abs() > EPSILON)
            .map_or(opportunities.len(), |offset| start + offset);

        opportunities[start..end].sort_by(|a, b| match a.route.len().cmp(&b.route.len()) {
            Ordering::Equal => b.profit.total_cmp(&a.profit),
            other => other,
        });

        start = end;
    }
}
