//! Graph Construction - Dense Rate Matrix
//!
//! Step 1.2: The Map Maker
//!
//! Turns an order-book snapshot into two dense N×N matrices over the
//! currency index:
//! - `rates`: what one unit of `i` becomes when sold into `j` (bid side)
//! - `offers`: the direct price paid to close a loop from `i` to `j` (ask side)
//!
//! `None` means the market has no quote in either direction. It is never 0.

use tracing::{debug, info};

use crate::model::{Currency, Pair, QuoteSnapshot};

/// Exchange-rate graph for one snapshot
#[derive(Debug, Clone)]
pub struct ArbitrageGraph {
    currencies: Vec<Currency>,
    rates: Vec<Vec<Option<f64>>>,
    offers: Vec<Vec<Option<f64>>>,
}

impl ArbitrageGraph {
    /// Build the graph for `currencies` (index = handle) from `quotes`
    pub fn from_quotes(currencies: &[Currency], quotes: &QuoteSnapshot) -> Self {
        let n = currencies.len();
        let mut rates = vec![vec![None; n]; n];
        let mut offers = vec![vec![None; n]; n];

        for (i, from) in currencies.iter().enumerate() {
            for (j, to) in currencies.iter().enumerate() {
                if i == j {
                    rates[i][j] = Some(1.0);
                    continue;
                }

                let pair = Pair::new(from, to);
                if let Some(order) = quotes.get(&pair) {
                    // Sell `from` into `to` at the best bid, close at the best ask
                    rates[i][j] = Some(order.bid.price);
                    offers[i][j] = Some(order.ask.price);
                } else if let Some(order) = quotes.get(&pair.reverse()) {
                    // Only `to_from` is listed: invert it
                    rates[i][j] = Some(1.0 / order.ask.price);
                    offers[i][j] = Some(1.0 / order.bid.price);
                }
            }
        }

        let graph = Self {
            currencies: currencies.to_vec(),
            rates,
            offers,
        };

        info!(
            "Graph built: {} Nodes, {} Edges",
            graph.node_count(),
            graph.edge_count()
        );
        debug!("  {} quoted pairs in snapshot", quotes.len());

        graph
    }

    pub fn node_count(&self) -> usize {
        self.currencies.len()
    }

    /// Directed market edges (self-loops excluded)
    pub fn edge_count(&self) -> usize {
        self.offers.iter().flatten().filter(|o| o.is_some()).count()
    }

    pub fn currency(&self, index: usize) -> Option<&Currency> {
        self.currencies.get(index)
    }

    /// Direct closing price `i -> j` (forward ask or inverted reverse bid)
    pub fn direct_offer(&self, i: usize, j: usize) -> Option<f64> {
        self.offers[i][j]
    }

    /// True when `i_j` or `j_i` is quoted
    pub fn has_market(&self, i: usize, j: usize) -> bool {
        self.offers[i][j].is_some()
    }

    /// Rate matrix copy used to seed the solver
    pub fn rate_matrix(&self) -> Vec<Vec<Option<f64>>> {
        self.rates.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Order;

    fn currencies(codes: &[&str]) -> Vec<Currency> {
        codes.iter().map(|c| Currency::from(*c)).collect()
    }

    #[test]
    fn test_forward_and_reverse_rates() {
        let mut quotes = QuoteSnapshot::new();
        quotes.insert(Pair::from("BTC_USD"), Order::new(3600.0, 3700.0));

        let graph = ArbitrageGraph::from_quotes(&currencies(&["BTC", "USD"]), &quotes);
        let rates = graph.rate_matrix();

        // BTC -> USD sells at the bid, closes at the ask
        assert_eq!(rates[0][1], Some(3600.0));
        assert_eq!(graph.direct_offer(0, 1), Some(3700.0));

        // USD -> BTC goes through the inverted reverse pair
        assert_eq!(rates[1][0], Some(1.0 / 3700.0));
        assert_eq!(graph.direct_offer(1, 0), Some(1.0 / 3600.0));

        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn test_diagonal_and_missing_edges() {
        let mut quotes = QuoteSnapshot::new();
        quotes.insert(Pair::from("BTC_USD"), Order::new(3700.0, 3700.0));

        let graph = ArbitrageGraph::from_quotes(&currencies(&["BTC", "USD", "EUR"]), &quotes);
        let rates = graph.rate_matrix();

        for i in 0..3 {
            assert_eq!(rates[i][i], Some(1.0));
            assert!(!graph.has_market(i, i));
        }

        // EUR has no quote in either direction
        assert_eq!(rates[0][2], None);
        assert_eq!(rates[2][1], None);
        assert!(!graph.has_market(2, 0));
        assert_eq!(graph.currency(2), Some(&Currency::from("EUR")));
    }

    #[test]
    fn test_forward_quote_wins_over_reverse() {
        let mut quotes = QuoteSnapshot::new();
        quotes.insert(Pair::from("BTC_USD"), Order::new(3600.0, 3700.0));
        quotes.insert(Pair::from("USD_BTC"), Order::new(0.0002, 0.0003));

        let rates = ArbitrageGraph::from_quotes(&currencies(&["BTC", "USD"]), &quotes).rate_matrix();

        assert_eq!(rates[0][1], Some(3600.0));
        assert_eq!(rates[1][0], Some(0.0002));
    }
}
