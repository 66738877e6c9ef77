use std::time::Duration;

use anyhow::Result;

use crate::{decode_vehicle_positions, IdSource, VehicleReport};

/// Polls one GTFS-Realtime vehicle positions endpoint, usually through a proxy that adds API
/// keys or CORS headers.
#[derive(Clone)]
pub struct FeedClient {
    client: reqwest::Client,
    url: String,
    id_source: IdSource,
}

impl FeedClient {
    pub fn new(url: String, id_source: IdSource, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| anyhow!("Couldn't create HTTP client: {err}"))?;
        Ok(Self {
            client,
            url,
            id_source,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn fetch(&self) -> Result<Vec<VehicleReport>> {
        let resp = self.client.get(&self.url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            bail!("{} returned {status}", self.url);
        }
        let bytes = resp.bytes().await?;
        decode_vehicle_positions(&bytes, self.id_source)
    }

    /// Like `fetch`, but a failure just means there's nothing new this time. Whatever was
    /// previously fetched stays valid.
    pub async fn poll(&self) -> Vec<VehicleReport> {
        self.batch_or_empty(self.fetch().await)
    }

    fn batch_or_empty(&self, result: Result<Vec<VehicleReport>>) -> Vec<VehicleReport> {
        match result {
            Ok(reports) => {
                debug!("Fetched {} vehicle reports from {}", reports.len(), self.url);
                reports
            }
            Err(err) => {
                warn!("Fetching {} failed: {err}", self.url);
                Vec::new()
            }
        }
    }
}
