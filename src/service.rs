//! Arbitrage Service
//!
//! Glues the market-data source to the engine:
//! currencies + pairs + order books -> graph -> paths -> ranked loops.
//! Every scan starts from a fresh snapshot; nothing is kept between scans
//! except whatever the source itself caches.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::brain::{MaxProductSolver, OpportunityRanker};
use crate::cartographer::{ArbitrageGraph, MarketData};
use crate::error::MarketDataError;
use crate::model::{ArbitrageOpportunity, Currency, Pair, QuoteSnapshot};

/// Run the whole engine over one snapshot
pub fn find_opportunities(currencies: &[Currency], quotes: &QuoteSnapshot) -> Vec<ArbitrageOpportunity> {
    let graph = ArbitrageGraph::from_quotes(currencies, quotes);
    let paths = MaxProductSolver::new(&graph).solve();
    OpportunityRanker::new(&graph, &paths).rank()
}

// ============================================
// CURRENCY FILTER
// ============================================

/// Restricts the currency universe before the graph is built
#[derive(Debug, Clone, Default)]
pub struct CurrencyFilter {
    whitelist: HashSet<Currency>,
    blacklist: HashSet<Currency>,
}

impl CurrencyFilter {
    pub fn new(whitelist: &[String], blacklist: &[String]) -> Self {
        let normalize = |codes: &[String]| -> HashSet<Currency> {
            codes
                .iter()
                .map(|c| c.trim().to_uppercase())
                .filter(|c| !c.is_empty())
                .map(Currency::new)
                .collect()
        };

        Self {
            whitelist: normalize(whitelist),
            blacklist: normalize(blacklist),
        }
    }

    pub fn allows(&self, currency: &Currency) -> bool {
        if self.blacklist.contains(currency) {
            return false;
        }
        self.whitelist.is_empty() || self.whitelist.contains(currency)
    }

    /// Keep order, drop what the filter rejects
    pub fn apply(&self, currencies: Vec<Currency>) -> Vec<Currency> {
        currencies.into_iter().filter(|c| self.allows(c)).collect()
    }
}

// ============================================
// SCAN REPORT
// ============================================

/// Result of one scan, ready for the presentation layer
#[derive(Debug, Clone)]
pub struct ScanReport {
    pub scanned_at: DateTime<Utc>,
    pub currency_count: usize,
    pub pair_count: usize,
    pub quoted_pair_count: usize,
    pub elapsed_ms: u128,
    pub opportunities: Vec<ArbitrageOpportunity>,
}

impl ScanReport {
    pub fn profitable_count(&self) -> usize {
        self.opportunities.iter().filter(|o| o.is_profitable()).count()
    }
}

// ============================================
// SERVICE
// ============================================

pub struct ArbitrageService<M> {
    market: M,
    filter: CurrencyFilter,
}

impl<M: MarketData> ArbitrageService<M> {
    pub fn with_filter(market: M, filter: CurrencyFilter) -> Self {
        Self { market, filter }
    }

    /// Currencies the engine will work with
    pub async fn currency_list(&self) -> Result<Vec<Currency>, MarketDataError> {
        let currencies = self.market.currency_list().await?;
        Ok(self.filter.apply(currencies))
    }

    /// Fetch a fresh snapshot and rank every loop in it.
    ///
    /// Any source failure aborts the scan; there is no partial result.
    pub async fn scan(&self) -> Result<ScanReport, MarketDataError> {
        let start = Instant::now();

        let currencies = self.currency_list().await?;
        let settings = self.market.pair_settings().await?;

        let universe: HashSet<&Currency> = currencies.iter().collect();
        let pairs: Vec<Pair> = settings
            .pairs()
            .into_iter()
            .filter(|pair| match pair.split() {
                Some((base, quote)) => universe.contains(&base) && universe.contains(&quote),
                None => false,
            })
            .collect();
        debug!(
            "{} of {} pairs fall inside the currency universe",
            pairs.len(),
            settings.len()
        );

        let quotes = self.market.order_book(&pairs).await?;
        if quotes.is_empty() {
            warn!("No usable order book among {} requested pairs", pairs.len());
        }
        let opportunities = find_opportunities(&currencies, &quotes);

        let report = ScanReport {
            scanned_at: Utc::now(),
            currency_count: currencies.len(),
            pair_count: pairs.len(),
            quoted_pair_count: quotes.len(),
            elapsed_ms: start.elapsed().as_millis(),
            opportunities,
        };

        info!(
            "Scan complete in {}ms: {} loops, {} profitable",
            report.elapsed_ms,
            report.opportunities.len(),
            report.profitable_count()
        );

        Ok(report)
    }
}
