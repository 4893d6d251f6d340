use anyhow::Result;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;
use wreq::{Client, Response};
use wreq_util::Emulation;

use crate::config::TransportConfig;

/// Build the shared HTTP client for one run. Connection reuse across
/// requests to the same host comes from the client's internal pool.
pub fn build_client(timeout_seconds: u64) -> Result<Client> {
    let client = Client::builder()
        .emulation(Emulation::Firefox136)
        .timeout(Duration::from_secs(timeout_seconds))
        .build()?;
    Ok(client)
}

/// GET with automatic retry-with-backoff on the configured status set
/// (server errors and rate limiting, by default). This is the inner retry
/// layer; callers like the prober add their own attempt loop on top, and
/// transport-level failures (timeout, reset) are returned immediately for
/// that outer loop to handle.
pub async fn get_with_backoff(
    client: &Client,
    url: &str,
    user_agent: &str,
    config: &TransportConfig,
) -> Result<Response, wreq::Error> {
    let mut attempt = 0;

    loop {
        let response = client
            .get(url)
            .header("User-Agent", user_agent)
            .send()
            .await?;

        let status = response.status().as_u16();
        if !config.retry_statuses.contains(&status) || attempt >= config.max_retries {
            return Ok(response);
        }

        attempt += 1;
        // Exponential backoff with jitter
        let delay = Duration::from_millis(
            config.backoff_base_ms * 2_u64.pow(attempt as u32) + (rand::random::<u64>() % 250),
        );
        warn!(
            "Retryable status {} from {}, backing off {:?} (attempt {}/{})",
            status, url, delay, attempt, config.max_retries
        );
        sleep(delay).await;
    }
}
