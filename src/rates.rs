//! Exchange-rate fetcher for the dashboard header.
//!
//! Fetches the buy/sell rate from the configured source once at startup and
//! then hourly. Any failure — transport error or non-2xx status — degrades to
//! a hardcoded fallback rate so the dashboard always has something to show.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Hardcoded fallback buy rate (PEN per USD).
pub const FALLBACK_BUY: f64 = 3.70;

/// Hardcoded fallback sell rate (PEN per USD).
pub const FALLBACK_SELL: f64 = 3.72;

/// How often the service refreshes the rate on its own.
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(3600);

/// A buy/sell exchange rate as of a given date.
///
/// Immutable once produced; the service replaces it wholesale on every fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRate {
    pub buy: f64,
    pub sell: f64,
    /// Date string as reported by the source (YYYY-MM-DD).
    pub as_of: String,
}

/// Wire format of the rate source.
#[derive(Debug, Deserialize)]
struct RateBody {
    compra: f64,
    venta: f64,
    fecha: String,
}

impl From<RateBody> for ExchangeRate {
    fn from(body: RateBody) -> Self {
        ExchangeRate {
            buy: body.compra,
            sell: body.venta,
            as_of: body.fecha,
        }
    }
}

#[derive(Debug, Error)]
pub enum RateError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Rate API returned status {0}")]
    HttpStatus(u16),
}

/// Fetch the current rate from the source.
///
/// Non-2xx responses and transport failures are the same failure class; the
/// caller substitutes [`fallback_rate`] for either.
pub async fn fetch_rate(url: &str) -> Result<ExchangeRate, RateError> {
    log::info!("🔍 Fetching exchange rate from {}", url);

    let client = Client::builder()
        .timeout(Duration::from_secs(10))
        .connect_timeout(Duration::from_secs(5))
        .build()?;

    let response = client.get(url).send().await?;

    if !response.status().is_success() {
        return Err(RateError::HttpStatus(response.status().as_u16()));
    }

    let body: RateBody = response.json().await?;
    let rate = ExchangeRate::from(body);
    log::info!("✅ Rate updated: buy {:.3} / sell {:.3} ({})", rate.buy, rate.sell, rate.as_of);
    Ok(rate)
}

/// The rate used when the source is unreachable, dated today.
pub fn fallback_rate() -> ExchangeRate {
    ExchangeRate {
        buy: FALLBACK_BUY,
        sell: FALLBACK_SELL,
        as_of: chrono::Local::now().format("%Y-%m-%d").to_string(),
    }
}
