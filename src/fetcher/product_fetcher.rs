use anyhow::Result;
use chrono::Utc;
use tracing::info;
use wreq::Client;

use crate::config::TrackerConfig;
use crate::fetcher::scheduler::{run_bounded, Progress};
use crate::fetcher::transport::{build_client, get_with_backoff};
use crate::models::{FetchError, FetchResult, ProductRecord};
use crate::processor::{FieldParser, PageExtractor};

/// Bounded-concurrency dispatcher for product pages: one GET + extract +
/// parse per target, at most `fetch.concurrency` in flight, every failure
/// captured as a per-target `FetchError`.
pub struct ProductFetcher {
    client: Client,
    config: TrackerConfig,
    extractor: PageExtractor,
    parser: FieldParser,
}

impl ProductFetcher {
    pub fn new(config: &TrackerConfig) -> Result<Self> {
        Ok(ProductFetcher {
            client: build_client(config.fetch.timeout_seconds)?,
            extractor: PageExtractor::new(&config.selectors)?,
            parser: FieldParser::new(),
            config: config.clone(),
        })
    }

    /// Fetch every target exactly once, returning results in completion
    /// order. Never fails as a whole; per-target errors ride along in the
    /// result list.
    pub async fn fetch_all(&self, ids: &[String]) -> Vec<FetchResult> {
        info!(
            "Fetching {} products with concurrency {}",
            ids.len(),
            self.config.fetch.concurrency
        );

        let progress = Progress::new("fetch", ids.len(), self.config.fetch.progress_every);
        run_bounded(
            ids.to_vec(),
            self.config.fetch.concurrency,
            |id| self.fetch_one(id),
            |done| progress.tick(done),
        )
        .await
    }

    async fn fetch_one(&self, id: String) -> FetchResult {
        let outcome = self.fetch_record(&id).await;
        FetchResult { id, outcome }
    }

    async fn fetch_record(&self, id: &str) -> Result<ProductRecord, FetchError> {
        let url = format!("{}{}", self.config.site.product_url, id);

        let response = get_with_backoff(
            &self.client,
            &url,
            &self.config.site.user_agent,
            &self.config.transport,
        )
        .await
        .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http(status.as_u16()));
        }

        let html = response
            .text()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        Ok(self.build_record(id, &html))
    }

    fn build_record(&self, id: &str, html: &str) -> ProductRecord {
        let page = self.extractor.extract(html);
        let (availability_start, availability_end) =
            self.parser.parse_availability(&page.availability);
        let parsed = self.parser.parse_description(&page.description);

        ProductRecord {
            id: id.to_string(),
            title: page.title.clone(),
            unavailable: page.is_unavailable(),
            availability_start,
            availability_end,
            prices: parsed.prices,
            unit_price: parsed.unit_price,
            daily_limit: parsed.daily_limit,
            timestamp: Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}
