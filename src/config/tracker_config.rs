use serde::{Deserialize, Serialize};

/// Run configuration for the tracker, one TOML file per deployment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub site: SiteConfig,
    pub fetch: FetchConfig,
    pub probe: ProbeConfig,
    pub transport: TransportConfig,
    pub selectors: SelectorConfig,
    pub paths: PathsConfig,
}

/// Basic site information.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub name: String,
    /// Prefix a product ID is appended to when building a fetch URL.
    pub product_url: String,
    pub user_agent: String,
}

/// Bounded-concurrency settings for the main product fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub concurrency: usize,
    pub timeout_seconds: u64,
    /// Emit a progress line after this many completed targets.
    pub progress_every: usize,
}

/// ID-space scan settings. The probe cap is deliberately lower than the
/// fetch cap because the site rate-limits unknown-ID traffic harder.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub start_id: u64,
    pub end_id: u64,
    pub batch_size: u64,
    pub concurrency: usize,
    pub max_attempts: usize,
    pub retry_delay_ms: u64,
}

/// Transport-level automatic retry policy, applied under every request
/// independently of the prober's own attempt loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub max_retries: usize,
    pub backoff_base_ms: u64,
    pub retry_statuses: Vec<u16>,
}

/// CSS selectors for the product page fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub title: String,
    pub unavailable: String,
    pub description: String,
    pub availability: String,
}

/// Input target list and persisted dataset locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub targets: String,
    pub dataset: String,
}

impl TrackerConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &str) -> Result<Self, anyhow::Error> {
        let content = std::fs::read_to_string(path)?;
        let config: TrackerConfig = toml::from_str(&content)?;
        Ok(config)
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: "biedronka".to_string(),
            product_url: "https://www.biedronka.pl/pl/product,id,".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
                         AppleWebKit/537.36 (KHTML, like Gecko) \
                         Chrome/116.0.0.0 Safari/537.36"
                .to_string(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            concurrency: 20,
            timeout_seconds: 10,
            progress_every: 500,
        }
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            start_id: 1,
            end_id: 999_999,
            batch_size: 10_000,
            concurrency: 10,
            max_attempts: 3,
            retry_delay_ms: 1000,
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_base_ms: 500,
            retry_statuses: vec![500, 502, 503, 504, 403],
        }
    }
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            title: "title".to_string(),
            unavailable: "span.product-unavailable".to_string(),
            description: "span.product-description".to_string(),
            availability: "span.product-availability".to_string(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            targets: "public/csv/id.csv".to_string(),
            dataset: "public/json/products.json".to_string(),
        }
    }
}
