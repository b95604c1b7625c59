//! EXMO Market Data Client
//!
//! Step 1.1: The Fetcher
//!
//! Public, unauthenticated endpoints only:
//! - `/currency/`        ordered currency codes
//! - `/pair_settings/`   tradable pairs with limits
//! - `/order_book/`      top of book for a comma-separated pair list
//!
//! Currency list and pair settings barely change, so they are cached for
//! `cache_ttl`. Order books are always fetched fresh.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info, trace};

use crate::error::MarketDataError;
use crate::model::{Currency, Order, Pair, PairSettings, QuoteSnapshot};

// ============================================
// CONSTANTS
// ============================================

/// EXMO public API base URL
pub const EXMO_BASE_URL: &str = "https://api.exmo.com/v1";

/// Cache duration for currency list and pair settings (24 hours)
pub const DEFAULT_CACHE_TTL_SECS: u64 = 24 * 60 * 60;

/// Timeout for API calls
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Each price level is `[price, quantity, amount]`
const LEVEL_FIELDS: usize = 3;

// ============================================
// MARKET DATA SOURCE
// ============================================

/// Anything that can feed the engine with currencies, pairs and quotes
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Ordered, deduplicated currency codes
    async fn currency_list(&self) -> Result<Vec<Currency>, MarketDataError>;

    /// Tradable pairs with their limits
    async fn pair_settings(&self) -> Result<PairSettings, MarketDataError>;

    /// Best bid/ask for `pairs`. Malformed books are left out of the snapshot.
    async fn order_book(&self, pairs: &[Pair]) -> Result<QuoteSnapshot, MarketDataError>;
}

// ============================================
// CACHE
// ============================================

#[derive(Debug, Clone)]
struct Cached<T> {
    value: T,
    fetched_at: Instant,
}

impl<T> Cached<T> {
    fn new(value: T) -> Self {
        Self {
            value,
            fetched_at: Instant::now(),
        }
    }

    fn is_stale(&self, ttl: Duration) -> bool {
        self.fetched_at.elapsed() >= ttl
    }
}

// ============================================
// EXMO CLIENT
// ============================================

pub struct ExmoClient {
    http_client: Client,
    base_url: String,
    cache_ttl: Duration,
    currencies: Arc<RwLock<Option<Cached<Vec<Currency>>>>>,
    pairs: Arc<RwLock<Option<Cached<PairSettings>>>>,
}

impl ExmoClient {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        cache_ttl: Duration,
    ) -> Result<Self, MarketDataError> {
        let http_client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            cache_ttl,
            currencies: Arc::new(RwLock::new(None)),
            pairs: Arc::new(RwLock::new(None)),
        })
    }

    /// GET `endpoint` and return the body. Anything but 200 is an error.
    async fn get(&self, endpoint: &'static str, query: &str) -> Result<String, MarketDataError> {
        let url = format!("{}{}{}", self.base_url, endpoint, query);
        trace!("GET {}", url);

        let response = self.http_client.get(&url).send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(MarketDataError::Status { endpoint, status });
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl MarketData for ExmoClient {
    async fn currency_list(&self) -> Result<Vec<Currency>, MarketDataError> {
        {
            let cache = self.currencies.read().await;
            if let Some(ref cached) = *cache {
                if !cached.is_stale(self.cache_ttl) {
                    trace!("Using cached currency list ({} codes)", cached.value.len());
                    return Ok(cached.value.clone());
                }
            }
        }

        let body = self.get("/currency/", "").await?;
        let list = parse_currency_list(&body).map_err(|source| MarketDataError::Decode {
            endpoint: "/currency/",
            source,
        })?;
        info!("Fetched {} currencies", list.len());

        *self.currencies.write().await = Some(Cached::new(list.clone()));

        Ok(list)
    }

    async fn pair_settings(&self) -> Result<PairSettings, MarketDataError> {
        {
            let cache = self.pairs.read().await;
            if let Some(ref cached) = *cache {
                if !cached.is_stale(self.cache_ttl) {
                    trace!("Using cached pair settings ({} pairs)", cached.value.len());
                    return Ok(cached.value.clone());
                }
            }
        }

        let body = self.get("/pair_settings/", "").await?;
        let settings: PairSettings =
            serde_json::from_str(&body).map_err(|source| MarketDataError::Decode {
                endpoint: "/pair_settings/",
                source,
            })?;

        if settings.is_empty() {
            return Err(MarketDataError::NoPairs);
        }
        info!("Fetched {} tradable pairs", settings.len());

        *self.pairs.write().await = Some(Cached::new(settings.clone()));

        Ok(settings)
    }

    async fn order_book(&self, pairs: &[Pair]) -> Result<QuoteSnapshot, MarketDataError> {
        if pairs.is_empty() {
            return Err(MarketDataError::EmptyPairRequest);
        }

        let body = self.get("/order_book/", &order_book_query(pairs)).await?;
        let snapshot = parse_order_book(&body).map_err(|source| MarketDataError::Decode {
            endpoint: "/order_book/",
            source,
        })?;

        info!(
            "Fetched order books: {} of {} pairs usable",
            snapshot.len(),
            pairs.len()
        );

        Ok(snapshot)
    }
}

// ============================================
// WIRE FORMAT
// ============================================

#[derive(Debug, Deserialize)]
struct RawBook {
    #[serde(default)]
    ask: Vec<Vec<String>>,
    #[serde(default)]
    bid: Vec<Vec<String>>,
}

/// `?limit=1&pair=A_B,C_D`
fn order_book_query(pairs: &[Pair]) -> String {
    let joined = pairs.iter().map(Pair::as_str).collect::<Vec<_>>().join(",");
    format!("?limit=1&pair={}", joined)
}

/// Decode `["USD","EUR",...]`, dropping repeated codes but keeping order
pub fn parse_currency_list(body: &str) -> Result<Vec<Currency>, serde_json::Error> {
    let raw: Vec<Currency> = serde_json::from_str(body)?;

    let mut seen = HashSet::new();
    Ok(raw.into_iter().filter(|c| seen.insert(c.clone())).collect())
}

/// Decode an order-book response into a snapshot.
///
/// Only a body that is not a JSON object fails. A single book is dropped (not
/// an error) when it has the wrong shape, a side is empty, the top level does
/// not have exactly three fields, or the top price is not a positive number.
pub fn parse_order_book(body: &str) -> Result<QuoteSnapshot, serde_json::Error> {
    let raw: HashMap<Pair, Value> = serde_json::from_str(body)?;

    let mut snapshot = QuoteSnapshot::new();
    for (pair, entry) in raw {
        let order = serde_json::from_value::<RawBook>(entry)
            .ok()
            .and_then(|book| top_of_book(&book));

        match order {
            Some(order) => snapshot.insert(pair, order),
            None => debug!("Dropping malformed order book for {}", pair),
        }
    }

    Ok(snapshot)
}

fn top_of_book(book: &RawBook) -> Option<Order> {
    let ask = top_price(&book.ask)?;
    let bid = top_price(&book.bid)?;
    Some(Order::new(bid, ask))
}

fn top_price(levels: &[Vec<String>]) -> Option<f64> {
    let top = levels.first()?;
    if top.len() != LEVEL_FIELDS {
        return None;
    }
    let price: f64 = top[0].parse().ok()?;

    // A zero or non-finite price would turn into inf once inverted
    if price <= 0.0 || !price.is_finite() {
        return None;
    }
    Some(price)
}
