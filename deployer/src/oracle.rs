// deployer/src/oracle.rs
//! Client for the Pyth Hermes price service.
//!
//! Prices are returned exactly as published (integer price plus exponent);
//! nothing here substitutes a default when the upstream misbehaves.

use chrono::{DateTime, TimeZone, Utc};
use lazy_static::lazy_static;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, info, instrument, warn};

use crate::config::OracleConfig;
use crate::errors::PriceFeedError;

pub const DEFAULT_HERMES_URL: &str = "https://hermes.pyth.network";

pub const USDC_USD_FEED: &str = "eaa020c61cc479712813461ce153894a96a6c00b21ed0cfc2798d1f9a9e9c94a";
pub const USDT_USD_FEED: &str = "2b89b9dc8fdf9f34709a5b106b472f0f39bb6ca9ce04b0fd7f2e971688e2e53b";

lazy_static! {
    /// Feed ids by pair symbol.
    pub static ref KNOWN_PRICE_FEEDS: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert("USDC/USD", USDC_USD_FEED);
        m.insert("USDT/USD", USDT_USD_FEED);
        m
    };
}

/// Feed id for a pair symbol such as `usdc/usd`. Case-insensitive.
pub fn feed_id_for_pair(pair: &str) -> Result<String, PriceFeedError> {
    let key = pair.trim().to_ascii_uppercase();
    KNOWN_PRICE_FEEDS
        .get(key.as_str())
        .map(|id| id.to_string())
        .ok_or_else(|| PriceFeedError::UnknownPair(pair.to_string()))
}

/// One published price. `price * 10^exponent` is the USD value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuote {
    pub id: String,
    pub price: i64,
    pub exponent: i32,
    pub confidence: u64,
    pub timestamp: i64,
}

impl PriceQuote {
    /// Display-only view; keep `price`/`exponent` for anything that matters.
    pub fn scaled_price(&self) -> f64 {
        self.price as f64 * 10f64.powi(self.exponent)
    }

    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.timestamp, 0).single()
    }
}

/// Quotes for the ids the service knew about, plus the ones it did not return.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PriceFeedResponse {
    pub quotes: Vec<PriceQuote>,
    pub missing: Vec<String>,
}

impl PriceFeedResponse {
    pub fn is_partial(&self) -> bool {
        !self.missing.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&PriceQuote> {
        let id = normalize_id(id).ok()?;
        self.quotes.iter().find(|q| q.id == id)
    }
}

/// Lowercase hex without `0x`, checked to be 32 bytes.
pub fn normalize_id(id: &str) -> Result<String, PriceFeedError> {
    let trimmed = id.trim();
    let stripped = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed)
        .to_ascii_lowercase();
    match hex::decode(&stripped) {
        Ok(bytes) if bytes.len() == 32 => Ok(stripped),
        _ => Err(PriceFeedError::InvalidId(id.to_string())),
    }
}

// Wire shapes of /api/latest_price_feeds. Hermes sends integers as strings.
#[derive(Debug, Deserialize)]
struct RawPriceFeed {
    id: String,
    price: RawPrice,
}

#[derive(Debug, Deserialize)]
struct RawPrice {
    price: String,
    conf: String,
    expo: i32,
    publish_time: i64,
}

impl RawPriceFeed {
    fn into_quote(self) -> Result<PriceQuote, PriceFeedError> {
        let id = normalize_id(&self.id).map_err(|_| {
            PriceFeedError::Malformed(format!("feed id {:?} is not a 32-byte hex string", self.id))
        })?;
        let price = self.price.price.parse::<i64>().map_err(|e| {
            PriceFeedError::Malformed(format!("price {:?} for {}: {}", self.price.price, id, e))
        })?;
        let confidence = self.price.conf.parse::<u64>().map_err(|e| {
            PriceFeedError::Malformed(format!("confidence {:?} for {}: {}", self.price.conf, id, e))
        })?;
        Ok(PriceQuote {
            id,
            price,
            exponent: self.price.expo,
            confidence,
            timestamp: self.price.publish_time,
        })
    }
}

/// Parses a Hermes response body against the ids that were asked for.
///
/// Feeds the caller did not request are ignored; requested ids absent from
/// the body end up in `missing`. Repeated ids are reported once.
pub fn parse_price_feeds(
    body: &str,
    requested: &[String],
) -> Result<PriceFeedResponse, PriceFeedError> {
    let raw: Vec<RawPriceFeed> =
        serde_json::from_str(body).map_err(|e| PriceFeedError::Malformed(e.to_string()))?;

    let mut by_id = BTreeMap::new();
    for feed in raw {
        let quote = feed.into_quote()?;
        by_id.insert(quote.id.clone(), quote);
    }

    let mut response = PriceFeedResponse::default();
    for id in dedup_ids(requested) {
        match by_id.get(&id) {
            Some(quote) => response.quotes.push(quote.clone()),
            None => response.missing.push(id),
        }
    }
    Ok(response)
}

/// First occurrence wins; order is kept.
fn dedup_ids(ids: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.iter().filter(|id| seen.insert(id.as_str())).cloned().collect()
}

#[derive(Debug, Clone)]
pub struct HermesClient {
    http: Client,
    base_url: String,
}

impl HermesClient {
    pub fn new(config: &OracleConfig) -> Result<Self, PriceFeedError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PriceFeedError::Unreachable(format!("http client: {}", e)))?;
        Ok(Self { http, base_url: config.hermes_url.trim_end_matches('/').to_string() })
    }

    /// Latest prices for `ids`. An empty id list makes no request.
    #[instrument(skip_all, fields(ids = ids.len()))]
    pub async fn fetch_prices(&self, ids: &[String]) -> Result<PriceFeedResponse, PriceFeedError> {
        let normalized = ids.iter().map(|id| normalize_id(id)).collect::<Result<Vec<_>, _>>()?;
        let requested = dedup_ids(&normalized);
        if requested.is_empty() {
            return Ok(PriceFeedResponse::default());
        }

        let url = format!("{}/api/latest_price_feeds", self.base_url);
        let query: Vec<(&str, &str)> = requested.iter().map(|id| ("ids[]", id.as_str())).collect();
        debug!(%url, "Requesting latest price feeds");

        let response = self
            .http
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| PriceFeedError::Unreachable(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PriceFeedError::Unreachable(e.to_string()))?;
        if !status.is_success() {
            return Err(PriceFeedError::Status { status: status.as_u16(), body });
        }

        let parsed = parse_price_feeds(&body, &requested)?;
        if parsed.is_partial() {
            warn!(missing = ?parsed.missing, "Price service returned no data for some feeds");
        }
        Ok(parsed)
    }

    /// USDT/USD and USDC/USD, in that order.
    pub async fn fetch_stablecoin_prices(&self) -> Result<PriceFeedResponse, PriceFeedError> {
        let ids = ["USDT/USD", "USDC/USD"]
            .iter()
            .map(|pair| feed_id_for_pair(pair))
            .collect::<Result<Vec<_>, _>>()?;
        let prices = self.fetch_prices(&ids).await?;
        for quote in &prices.quotes {
            info!(
                id = %quote.id,
                price = quote.price,
                expo = quote.exponent,
                "Stablecoin price {:.6}",
                quote.scaled_price()
            );
        }
        Ok(prices)
    }
}
