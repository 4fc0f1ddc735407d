use crate::config::advisory::QuotesConfig;
use crate::domain::model::Quote;
use crate::utils::error::{ReportError, Result};
use futures::future::{BoxFuture, FutureExt};
use futures::stream::{self, StreamExt, TryStreamExt};
use reqwest::Client;
use serde_json::Value;

/// 行情 API 用戶端：`GET {endpoint}?symbol=XYZ&apikey=...`
pub struct HttpQuoteClient {
    client: Client,
    config: QuotesConfig,
}

impl HttpQuoteClient {
    pub fn new(config: QuotesConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self { client, config })
    }

    pub async fn fetch_quote(&self, symbol: &str) -> Result<Quote> {
        let attempts = self.config.retry_attempts() + 1;
        let mut attempt = 1;
        loop {
            match self.fetch_once(symbol).await {
                Ok(quote) => return Ok(quote),
                Err(e) if e.is_retryable() && attempt < attempts => {
                    tracing::warn!(
                        "🔁 Quote request for {} failed (attempt {}/{}): {}",
                        symbol,
                        attempt,
                        attempts,
                        e
                    );
                    tokio::time::sleep(self.config.retry_delay()).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Fetches all symbols with bounded concurrency; results keep input order.
    pub async fn fetch_quotes(&self, symbols: &[String]) -> Result<Vec<Quote>> {
        let requests: Vec<BoxFuture<'_, Result<Quote>>> = symbols
            .iter()
            .map(|s| self.fetch_quote(s).boxed())
            .collect();
        stream::iter(requests)
            .buffered(self.config.concurrent_requests())
            .try_collect()
            .await
    }

    async fn fetch_once(&self, symbol: &str) -> Result<Quote> {
        let mut query: Vec<(&str, &str)> = self
            .config
            .extra_params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        query.push((self.config.symbol_param.as_str(), symbol));
        if let Some(key) = &self.config.api_key {
            query.push((self.config.api_key_param.as_str(), key.as_str()));
        }

        tracing::debug!("Making quote request to: {} ({})", self.config.endpoint, symbol);
        let response = self
            .client
            .get(&self.config.endpoint)
            .query(&query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ReportError::UpstreamError {
                service: "Quote API".to_string(),
                status: status.as_u16(),
                message,
            });
        }

        let body: Value = response.json().await?;
        let price = extract_price(&body, &self.config.price_pointer).ok_or_else(|| {
            ReportError::ValidationError {
                message: format!(
                    "No positive numeric price at '{}' in quote response for {}",
                    self.config.price_pointer, symbol
                ),
            }
        })?;

        Ok(Quote {
            symbol: symbol.to_string(),
            price,
        })
    }
}

/// 價格可能是數字或數字字串；必須是正的有限值
pub fn extract_price(body: &Value, pointer: &str) -> Option<f64> {
    let price = match body.pointer(pointer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    (price.is_finite() && price > 0.0).then_some(price)
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use std::collections::BTreeMap;

    fn config(endpoint: String) -> QuotesConfig {
        QuotesConfig {
            endpoint,
            api_key: Some("demo".to_string()),
            symbol_param: "symbol".to_string(),
            api_key_param: "apikey".to_string(),
            price_pointer: "/price".to_string(),
            extra_params: BTreeMap::new(),
            timeout_seconds: Some(5),
            retry_attempts: Some(2),
            retry_delay_ms: Some(1),
            concurrent_requests: Some(2),
        }
    }

    #[test]
    fn test_extract_price_number_and_string() {
        let body = serde_json::json!({"price": 12.5});
        assert_eq!(extract_price(&body, "/price"), Some(12.5));

        let body = serde_json::json!({"Global Quote": {"05. price": " 187.4400 "}});
        assert_eq!(extract_price(&body, "/Global Quote/05. price"), Some(187.44));

        let body = serde_json::json!({"price": null});
        assert_eq!(extract_price(&body, "/price"), None);
        assert_eq!(extract_price(&body, "/missing"), None);
    }

    #[test]
    fn test_extract_price_rejects_non_finite_and_non_positive() {
        for raw in ["NaN", "inf", "-inf", "-5", "0", "abc"] {
            let body = serde_json::json!({ "price": raw });
            assert_eq!(extract_price(&body, "/price"), None, "price {:?}", raw);
        }
        let body = serde_json::json!({"price": -12.5});
        assert_eq!(extract_price(&body, "/price"), None);
        let body = serde_json::json!({"price": 0});
        assert_eq!(extract_price(&body, "/price"), None);
    }

    #[tokio::test]
    async fn test_nan_price_is_validation_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/quote");
            then.status(200).json_body(serde_json::json!({"price": "NaN"}));
        });

        let client = HttpQuoteClient::new(config(server.url("/quote"))).unwrap();
        let err = client.fetch_quote("XYZ").await.unwrap_err();
        assert!(matches!(err, ReportError::ValidationError { .. }));
    }

    #[tokio::test]
    async fn test_fetch_quote_sends_symbol_and_key() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/quote")
                .query_param("symbol", "XYZ")
                .query_param("apikey", "demo");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({"price": 40.0}));
        });

        let client = HttpQuoteClient::new(config(server.url("/quote"))).unwrap();
        let quote = client.fetch_quote("XYZ").await.unwrap();

        api_mock.assert();
        assert_eq!(quote.symbol, "XYZ");
        assert_eq!(quote.price, 40.0);
    }

    #[tokio::test]
    async fn test_fetch_quote_retries_server_errors() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/quote");
            then.status(503).body("busy");
        });

        let client = HttpQuoteClient::new(config(server.url("/quote"))).unwrap();
        let err = client.fetch_quote("XYZ").await.unwrap_err();

        // 1 initial attempt + 2 retries
        api_mock.assert_hits(3);
        assert!(matches!(err, ReportError::UpstreamError { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_fetch_quote_does_not_retry_client_errors() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/quote");
            then.status(404).body("unknown symbol");
        });

        let client = HttpQuoteClient::new(config(server.url("/quote"))).unwrap();
        let err = client.fetch_quote("NOPE").await.unwrap_err();

        api_mock.assert_hits(1);
        assert!(err.to_string().contains("unknown symbol"));
    }

    #[tokio::test]
    async fn test_fetch_quotes_keeps_input_order() {
        let server = MockServer::start();
        for (symbol, price) in [("AAA", 1.0), ("BBB", 2.0), ("CCC", 3.0)] {
            server.mock(|when, then| {
                when.method(GET).path("/quote").query_param("symbol", symbol);
                then.status(200).json_body(serde_json::json!({"price": price}));
            });
        }

        let client = HttpQuoteClient::new(config(server.url("/quote"))).unwrap();
        let symbols: Vec<String> = ["CCC", "AAA", "BBB"].iter().map(|s| s.to_string()).collect();
        let quotes = client.fetch_quotes(&symbols).await.unwrap();

        let got: Vec<(&str, f64)> = quotes.iter().map(|q| (q.symbol.as_str(), q.price)).collect();
        assert_eq!(got, vec![("CCC", 3.0), ("AAA", 1.0), ("BBB", 2.0)]);
    }

    #[tokio::test]
    async fn test_missing_price_is_validation_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/quote");
            then.status(200).json_body(serde_json::json!({"Note": "rate limited"}));
        });

        let client = HttpQuoteClient::new(config(server.url("/quote"))).unwrap();
        let err = client.fetch_quote("XYZ").await.unwrap_err();
        assert!(matches!(err, ReportError::ValidationError { .. }));
    }
}
