//! Market Data Model
//!
//! Currencies, pairs and the order-book snapshot the engine runs on.
//! Everything here is a plain value type; the engine never mutates
//! a snapshot once it has been handed over.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Separator between the two legs of a pair code (`BTC_USD`)
pub const PAIR_SEPARATOR: &str = "_";

// ============================================
// CURRENCY & PAIR
// ============================================

/// Short currency code (e.g. `BTC`, `USDT`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Currency(String);

impl Currency {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Currency {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

/// Trading pair written `BASE_QUOTE`.
///
/// Both prices quoted for `A_B` are expressed in units of `B` per unit of `A`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pair(String);

impl Pair {
    /// Build the pair code for `base` priced in `quote`
    pub fn new(base: &Currency, quote: &Currency) -> Self {
        Self(format!("{}{}{}", base, PAIR_SEPARATOR, quote))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split into `(base, quote)`. `None` unless the code has exactly two legs.
    pub fn split(&self) -> Option<(Currency, Currency)> {
        let mut legs = self.0.split(PAIR_SEPARATOR);
        match (legs.next(), legs.next(), legs.next()) {
            (Some(base), Some(quote), None) => Some((Currency::new(base), Currency::new(quote))),
            _ => None,
        }
    }

    /// Same pair with its legs swapped (`BTC_USD` -> `USD_BTC`)
    pub fn reverse(&self) -> Self {
        let legs: Vec<&str> = self.0.rsplit(PAIR_SEPARATOR).collect();
        Self(legs.join(PAIR_SEPARATOR))
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Pair {
    fn from(code: &str) -> Self {
        Self(code.to_string())
    }
}

// ============================================
// QUOTES
// ============================================

/// A single price level. Quantity is deliberately not carried.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    pub price: f64,
}

impl Offer {
    pub fn new(price: f64) -> Self {
        Self { price }
    }
}

/// Best bid and best ask observed for one pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub ask: Offer,
    pub bid: Offer,
}

impl Order {
    pub fn new(bid: f64, ask: f64) -> Self {
        Self {
            ask: Offer::new(ask),
            bid: Offer::new(bid),
        }
    }
}

/// Order-book snapshot: one `Order` per quoted pair
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuoteSnapshot(HashMap<Pair, Order>);

impl QuoteSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, pair: Pair, order: Order) {
        self.0.insert(pair, order);
    }

    pub fn get(&self, pair: &Pair) -> Option<&Order> {
        self.0.get(pair)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(Pair, Order)> for QuoteSnapshot {
    fn from_iter<I: IntoIterator<Item = (Pair, Order)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// ============================================
// PAIR SETTINGS
// ============================================

/// Exchange trading limits for one pair (unused by the engine itself)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Setting {
    #[serde(with = "string_f64")]
    pub min_quantity: f64,
    #[serde(with = "string_f64")]
    pub max_quantity: f64,
    #[serde(with = "string_f64")]
    pub min_price: f64,
    #[serde(with = "string_f64")]
    pub max_price: f64,
    #[serde(with = "string_f64")]
    pub min_amount: f64,
    #[serde(with = "string_f64")]
    pub max_amount: f64,
}

/// Every tradable pair with its limits
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PairSettings(HashMap<Pair, Setting>);

impl PairSettings {
    /// Pair keys in a stable (sorted) order
    pub fn pairs(&self) -> Vec<Pair> {
        let mut pairs: Vec<Pair> = self.0.keys().cloned().collect();
        pairs.sort();
        pairs
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(Pair, Setting)> for PairSettings {
    fn from_iter<I: IntoIterator<Item = (Pair, Setting)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// EXMO sends every number in pair settings as a JSON string
mod string_f64 {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

// ============================================
// RESULT
// ============================================

/// One ranked round trip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArbitrageOpportunity {
    /// Return multiplier, 1.0 = break-even
    pub profit: f64,

    /// Currencies visited, first == last
    pub route: Vec<Currency>,
}

impl ArbitrageOpportunity {
    pub fn profit_percentage(&self) -> f64 {
        (self.profit - 1.0) * 100.0
    }

    pub fn hop_count(&self) -> usize {
        self.route.len().saturating_sub(1)
    }

    pub fn is_profitable(&self) -> bool {
        self.profit > 1.0
    }

    /// Closed route, positive profit
    pub fn is_valid(&self) -> bool {
        self.route.len() >= 2
            && self.route.first() == self.route.last()
            && self.profit > 0.0
            && self.profit.is_finite()
    }

    pub fn format_route(&self) -> String {
        self.route
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(" → ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_split_and_reverse() {
        let pair = Pair::from("BTC_USD");
        assert_eq!(pair.split(), Some((Currency::from("BTC"), Currency::from("USD"))));
        assert_eq!(pair.reverse(), Pair::from("USD_BTC"));
        assert_eq!(Pair::new(&"USD".into(), &"BTC".into()), pair.reverse());

        assert_eq!(Pair::from("BTCUSD").split(), None);
        assert_eq!(Pair::from("A_B_C").split(), None);
    }

    #[test]
    fn test_pair_settings_from_exmo_json() {
        let json = r#"{"BTC_USD":{"min_quantity":"0.001","max_quantity":"1000","min_price":"1","max_price":"30000","max_amount":"500000","min_amount":"1"}}"#;
        let settings: PairSettings = serde_json::from_str(json).unwrap();

        let expected: PairSettings = [(
            Pair::from("BTC_USD"),
            Setting {
                min_quantity: 1e-3,
                max_quantity: 1e3,
                min_price: 1.0,
                max_price: 3e4,
                min_amount: 1.0,
                max_amount: 5e5,
            },
        )]
        .into_iter()
        .collect();

        assert_eq!(settings, expected);
        assert_eq!(settings.pairs(), vec![Pair::from("BTC_USD")]);
    }

    #[test]
    fn test_opportunity_validation() {
        let ok = ArbitrageOpportunity {
            profit: 1.01,
            route: vec!["BTC".into(), "USD".into(), "BTC".into()],
        };
        assert!(ok.is_valid());
        assert!(ok.is_profitable());
        assert_eq!(ok.hop_count(), 2);
        assert_eq!(ok.format_route(), "BTC → USD → BTC");

        let open = ArbitrageOpportunity {
            profit: 1.01,
            route: vec!["BTC".into(), "USD".into()],
        };
        assert!(!open.is_valid());
    }
}
