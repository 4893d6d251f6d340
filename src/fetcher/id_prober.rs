use anyhow::{bail, Result};
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, info};
use wreq::Client;

use crate::config::TrackerConfig;
use crate::fetcher::scheduler::run_bounded;
use crate::fetcher::transport::{build_client, get_with_backoff};

/// Scans a contiguous ID range in batches and reports which IDs resolve to
/// a live product page. Runs under a tighter concurrency cap than the main
/// fetch because unknown-ID traffic trips the site's rate limiting sooner.
pub struct IdProber {
    client: Client,
    config: TrackerConfig,
}

impl IdProber {
    pub fn new(config: &TrackerConfig) -> Result<Self> {
        if config.probe.batch_size == 0 {
            bail!("probe.batch_size must be at least 1");
        }
        if config.probe.end_id < config.probe.start_id {
            bail!(
                "probe ID range is empty: {}..={}",
                config.probe.start_id,
                config.probe.end_id
            );
        }

        Ok(IdProber {
            client: build_client(config.fetch.timeout_seconds)?,
            config: config.clone(),
        })
    }

    /// Probe the configured range and return the resolved IDs in ascending
    /// order.
    pub async fn probe_range(&self) -> Vec<u64> {
        let probe = &self.config.probe;
        let total = probe.end_id - probe.start_id + 1;
        let started = Instant::now();

        info!(
            "Probing IDs {}..={} in batches of {} (concurrency {})",
            probe.start_id, probe.end_id, probe.batch_size, probe.concurrency
        );

        let mut resolved = Vec::new();
        let mut checked: u64 = 0;
        let mut batch_start = probe.start_id;

        while batch_start <= probe.end_id {
            let batch_end = probe.end_id.min(batch_start + probe.batch_size - 1);
            let batch: Vec<u64> = (batch_start..=batch_end).collect();
            let batch_len = batch.len() as u64;

            let statuses = run_bounded(
                batch,
                probe.concurrency,
                |id| self.probe_one(id),
                |_| {},
            )
            .await;

            let before = resolved.len();
            resolved.extend(
                statuses
                    .into_iter()
                    .filter(|(_, status)| *status == Some(200))
                    .map(|(id, _)| id),
            );

            checked += batch_len;
            let elapsed = started.elapsed();
            let eta = elapsed / checked as u32 * (total - checked) as u32;
            info!(
                "Batch {}..={}: {} live ({} total), {}/{} checked, ETA {:.0?}",
                batch_start,
                batch_end,
                resolved.len() - before,
                resolved.len(),
                checked,
                total,
                eta
            );

            batch_start = batch_end + 1;
        }

        resolved.sort_unstable();
        resolved
    }

    /// Check one ID with up to `max_attempts` application-level attempts on
    /// top of the transport's own backoff. 403 and transport failures are
    /// retried after a short delay; any other status is terminal.
    async fn probe_one(&self, id: u64) -> (u64, Option<u16>) {
        let url = format!("{}{}", self.config.site.product_url, id);
        let retry_delay = Duration::from_millis(self.config.probe.retry_delay_ms);

        for attempt in 1..=self.config.probe.max_attempts {
            match get_with_backoff(
                &self.client,
                &url,
                &self.config.site.user_agent,
                &self.config.transport,
            )
            .await
            {
                Ok(response) => {
                    let status = response.status().as_u16();
                    match status {
                        200 => return (id, Some(200)),
                        403 => {
                            debug!("Forbidden (403), retry {}: {}", attempt, url);
                            sleep(retry_delay).await;
                        }
                        other => return (id, Some(other)),
                    }
                }
                Err(e) => {
                    debug!("Error probing {}: {}", url, e);
                    sleep(retry_delay).await;
                }
            }
        }

        (id, None)
    }
}
