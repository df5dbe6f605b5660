//! Remote retrieval of monthly trip files.
//!
//! [`HttpClient`] is the transport seam, [`fetch_bytes`] performs a checked
//! GET through it, and [`Source`] is the byte-level capability the ingest
//! loop depends on so that tests can serve fixtures instead of the network.

mod basic;
mod client;

pub use basic::{BasicClient, CONNECT_TIMEOUT, REQUEST_TIMEOUT};
pub use client::HttpClient;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use bytes::Bytes;

use crate::months::MonthKey;

/// Public CloudFront mirror of the TLC trip record files.
pub const DEFAULT_BASE_URL: &str = "https://d37ci6vzurychx.cloudfront.net/trip-data";

/// Builds the address of one monthly file, e.g.
/// `{base}/yellow_tripdata_2025-01.parquet`.
pub fn trip_data_url(base_url: &str, category: &str, month: MonthKey) -> String {
    format!(
        "{}/{}_tripdata_{:04}-{:02}.parquet",
        base_url.trim_end_matches('/'),
        category,
        month.year(),
        month.month()
    )
}

/// Issues a GET for `url` and returns the body.
///
/// # Errors
///
/// Returns an error on transport failure, timeout, or a non-success status.
pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Bytes> {
    let req = reqwest::Request::new(reqwest::Method::GET, url.parse()?);

    let resp = client.execute(req).await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(anyhow!("GET {url} returned status {status}"));
    }
    Ok(resp.bytes().await?)
}

/// Retrieves the raw payload stored at an address.
#[async_trait]
pub trait Source: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Bytes>;
}

/// [`Source`] backed by an [`HttpClient`].
pub struct HttpSource<C> {
    client: C,
}

impl<C: HttpClient> HttpSource<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<C: HttpClient> Source for HttpSource<C> {
    async fn fetch(&self, url: &str) -> Result<Bytes> {
        fetch_bytes(&self.client, url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trip_data_url_pads_month() {
        let url = trip_data_url(DEFAULT_BASE_URL, "yellow", MonthKey::from_ym_opt(2025, 1).unwrap());
        assert_eq!(
            url,
            "https://d37ci6vzurychx.cloudfront.net/trip-data/yellow_tripdata_2025-01.parquet"
        );
    }

    #[test]
    fn test_trip_data_url_trims_trailing_slash() {
        let month = MonthKey::from_ym_opt(2024, 12).unwrap();
        let url = trip_data_url("http://localhost:8080/trip-data/", "green", month);
        assert_eq!(url, "http://localhost:8080/trip-data/green_tripdata_2024-12.parquet");
    }

    #[tokio::test]
    async fn test_fetch_bytes_rejects_invalid_url() {
        let client = BasicClient::new().unwrap();
        let result = fetch_bytes(&client, "not a url").await;
        assert!(result.is_err());
    }
}
