//! HTTP collector client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use scarab_core::event::{Envelope, EventSink};
use scarab_core::{Result, ScarabError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the external event collection endpoint.
///
/// POSTs one JSON envelope per call. The response body is never read; the
/// collector is a write-only sink and the page never depends on what it
/// returns.
#[derive(Clone)]
pub struct HttpCollector {
    client: Client,
    url: String,
}

impl HttpCollector {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl EventSink for HttpCollector {
    async fn deliver(&self, envelope: &Envelope) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .timeout(REQUEST_TIMEOUT)
            .json(envelope)
            .send()
            .await
            .map_err(|err| {
                ScarabError::telemetry(format!("collector request failed: {err}"))
            })?;

        if !response.status().is_success() {
            return Err(ScarabError::telemetry(format!(
                "collector rejected event {}: HTTP {}",
                envelope.event_id,
                response.status()
            )));
        }
        Ok(())
    }
}
