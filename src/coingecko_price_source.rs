// src/coingecko_price_source.rs

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::price_feeds::PriceSource;

/// CoinGecko `simple/price` endpoint as a [`PriceSource`].
pub struct CoinGeckoPriceSource {
    base_url: String,
    client: reqwest::Client,
}

// simple/price returns { "<id>": { "usd": price } }
type CoinGeckoPriceResponse = HashMap<String, CoinGeckoTokenPrice>;

#[derive(Debug, Deserialize)]
struct CoinGeckoTokenPrice {
    usd: f64,
}

impl CoinGeckoPriceSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn price_url(&self, asset_id: &str) -> String {
        format!(
            "{}/simple/price?ids={}&vs_currencies=usd",
            self.base_url, asset_id
        )
    }
}

#[async_trait]
impl PriceSource for CoinGeckoPriceSource {
    fn name(&self) -> &'static str {
        "CoinGecko"
    }

    async fn fetch_usd_price(&self, asset_id: &str) -> Result<f64> {
        let response = self
            .client
            .get(self.price_url(asset_id))
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("HTTP request failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            if status.as_u16() == 429 {
                return Err(anyhow::anyhow!("Rate limited (429)"));
            }
            return Err(anyhow::anyhow!("HTTP error: {}", status));
        }

        let price_data: CoinGeckoPriceResponse = response
            .json()
            .await
            .map_err(|e| anyhow::anyhow!("JSON parse failed: {}", e))?;

        price_data
            .get(asset_id)
            .map(|p| p.usd)
            .ok_or_else(|| anyhow::anyhow!("No USD price for '{}' in response", asset_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_is_built_without_double_slash() {
        let source = CoinGeckoPriceSource::new("https://api.coingecko.com/api/v3/", Duration::from_secs(1)).unwrap();
        assert_eq!(
            source.price_url("sonic-3"),
            "https://api.coingecko.com/api/v3/simple/price?ids=sonic-3&vs_currencies=usd"
        );
    }
}
