//! Max-Product Floyd-Warshall
//!
//! Step 2.1: The Pathfinder
//!
//! All-pairs relaxation where a path is worth the *product* of its rates
//! and bigger is better. Runs in O(N³) over the dense graph.
//!
//! Relaxation only touches cells `(i, j)` that have a real market between
//! `i` and `j` (either direction quoted); the intermediate legs may be
//! anything reachable. That keeps the output limited to loops that can
//! actually be closed by trading the `i`/`j` instrument.

use tracing::{debug, trace};

use crate::cartographer::ArbitrageGraph;

/// Comparison tolerance shared by relaxation and ranking
pub const EPSILON: f64 = 1e-6;

/// Solver output: best compounded rates plus the predecessor matrix
#[derive(Debug, Clone)]
pub struct ShortestPaths {
    pub(super) best: Vec<Vec<Option<f64>>>,
    pub(super) pred: Vec<Vec<usize>>,
}

impl ShortestPaths {
    pub fn len(&self) -> usize {
        self.best.len()
    }

    /// Best compounded rate `i -> j`, `None` if unreachable
    pub fn best(&self, i: usize, j: usize) -> Option<f64> {
        self.best[i][j]
    }

    /// Currency preceding `j` on the best path out of `i`
    pub fn predecessor(&self, i: usize, j: usize) -> usize {
        self.pred[i][j]
    }

    /// Rebuild the closed loop `[i, intermediates.., j, i]`.
    ///
    /// Follows `pred[k][j]` starting at `k = i` until it settles. The walk is
    /// capped at N steps so a corrupted matrix cannot spin forever.
    pub fn route(&self, i: usize, j: usize) -> Vec<usize> {
        if i == j {
            return vec![i, i];
        }

        let mut route = vec![i];
        let mut k = i;
        for _ in 0..self.len() {
            let next = self.predecessor(k, j);
            if next == k {
                break;
            }
            k = next;
            route.push(k);
        }

        route.push(j);
        route.push(i);
        route
    }
}

/// Max-product all-pairs solver over an `ArbitrageGraph`
pub struct MaxProductSolver<'a> {
    graph: &'a ArbitrageGraph,
}

impl<'a> MaxProductSolver<'a> {
    pub fn new(graph: &'a ArbitrageGraph) -> Self {
        Self { graph }
    }

    pub fn solve(&self) -> ShortestPaths {
        let n = self.graph.node_count();
        let mut best = self.graph.rate_matrix();
        let mut pred: Vec<Vec<usize>> = (0..n).map(|i| vec![i; n]).collect();
        let mut updates = 0usize;

        // k must stay the outer loop: every pass reads what the last one wrote
        for k in 0..n {
            for i in 0..n {
                let Some(via_k) = best[i][k] else {
                    continue;
                };

                for j in 0..n {
                    if !self.graph.has_market(i, j) {
                        continue;
                    }
                    let Some(from_k) = best[k][j] else {
                        continue;
                    };

                    let candidate = via_k * from_k;
                    let improves = match best[i][j] {
                        Some(current) => current + EPSILON < candidate,
                        None => true,
                    };

                    if improves {
                        trace!(k, i, j, candidate, "relaxed");
                        best[i][j] = Some(candidate);
                        pred[i][j] = pred[k][j];
                        updates += 1;
                    }
                }
            }
        }

        debug!("Floyd-Warshall: {} nodes, {} relaxations", n, updates);

        ShortestPaths { best, pred }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Currency, Order, Pair, QuoteSnapshot};

    fn graph(codes: &[&str], quotes: &[(&str, f64, f64)]) -> ArbitrageGraph {
        let currencies: Vec<Currency> = codes.iter().map(|c| Currency::from(*c)).collect();
        let snapshot: QuoteSnapshot = quotes
            .iter()
            .map(|(pair, bid, ask)| (Pair::from(*pair), Order::new(*bid, *ask)))
            .collect();
        ArbitrageGraph::from_quotes(&currencies, &snapshot)
    }

    #[test]
    fn test_identity_and_direct_rates() {
        let g = graph(&["BTC", "USD"], &[("BTC_USD", 3600.0, 3700.0)]);
        let paths = MaxProductSolver::new(&g).solve();

        assert_eq!(paths.best(0, 0), Some(1.0));
        assert_eq!(paths.best(0, 1), Some(3600.0));
        assert_eq!(paths.best(1, 0), Some(1.0 / 3700.0));
        assert_eq!(paths.route(0, 1), vec![0, 1, 0]);
        assert_eq!(paths.route(1, 1), vec![1, 1]);
    }

    #[test]
    fn test_multi_hop_beats_direct() {
        // A -> B -> C = 2 * 3 = 6 beats A -> C = 5
        let g = graph(
            &["A", "B", "C"],
            &[("A_B", 2.0, 2.0), ("B_C", 3.0, 3.0), ("A_C", 5.0, 5.0)],
        );
        let paths = MaxProductSolver::new(&g).solve();

        assert!((paths.best(0, 2).unwrap() - 6.0).abs() < EPSILON);
        assert_eq!(paths.predecessor(0, 2), 1);
        assert_eq!(paths.route(0, 2), vec![0, 1, 2, 0]);
    }

    #[test]
    fn test_equal_paths_keep_first_found() {
        // A -> B -> C = 2 * 3 = 6 exactly matches the direct A -> C
        let g = graph(
            &["A", "B", "C"],
            &[("A_B", 2.0, 2.0), ("B_C", 3.0, 3.0), ("A_C", 6.0, 6.0)],
        );
        let paths = MaxProductSolver::new(&g).solve();

        assert_eq!(paths.best(0, 2), Some(6.0));
        assert_eq!(paths.predecessor(0, 2), 0);
        assert_eq!(paths.route(0, 2), vec![0, 2, 0]);
    }

    #[test]
    fn test_gain_within_epsilon_is_not_adopted() {
        // 2 * 3.0000001 = 6.0000002 beats 6 by less than EPSILON
        let g = graph(
            &["A", "B", "C"],
            &[("A_B", 2.0, 2.0), ("B_C", 3.0000001, 3.0000001), ("A_C", 6.0, 6.0)],
        );
        let paths = MaxProductSolver::new(&g).solve();

        assert_eq!(paths.best(0, 2), Some(6.0));
        assert_eq!(paths.predecessor(0, 2), 0);
        assert_eq!(paths.route(0, 2), vec![0, 2, 0]);
    }

    #[test]
    fn test_gain_above_epsilon_is_adopted() {
        // 2 * 3.001 = 6.002 beats 6 by well over EPSILON
        let g = graph(
            &["A", "B", "C"],
            &[("A_B", 2.0, 2.0), ("B_C", 3.001, 3.001), ("A_C", 6.0, 6.0)],
        );
        let paths = MaxProductSolver::new(&g).solve();

        assert!((paths.best(0, 2).unwrap() - 6.002).abs() < EPSILON);
        assert_eq!(paths.predecessor(0, 2), 1);
        assert_eq!(paths.route(0, 2), vec![0, 1, 2, 0]);
    }

    #[test]
    fn test_no_market_cells_are_never_relaxed() {
        // USD and EUR are both reachable through BTC but never trade directly
        let g = graph(
            &["BTC", "USD", "EUR"],
            &[("BTC_USD", 3600.0, 3700.0), ("BTC_EUR", 2900.0, 3100.0)],
        );
        let paths = MaxProductSolver::new(&g).solve();

        assert_eq!(paths.best(1, 2), None);
        assert_eq!(paths.best(2, 1), None);
    }

    #[test]
    fn test_route_walk_is_bounded() {
        // Deliberately cyclic predecessor chain
        let paths = ShortestPaths {
            best: vec![vec![Some(1.0); 3]; 3],
            pred: vec![vec![1, 1, 1], vec![0, 0, 0], vec![2, 2, 2]],
        };

        let route = paths.route(0, 2);
        assert_eq!(route.len(), 3 + 3);
        assert_eq!(route.first(), route.last());
    }
}
