use serde::{Deserialize, Serialize};
use std::fmt;

/// One point-in-time price observation. Empty strings mean the field was
/// absent on the page (or the pattern did not match); `discount_percent` 0
/// means no discount.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceSnapshot {
    pub regular_price: String,
    pub promo_price: String,
    pub unit: String,
    pub discount_percent: u32,
}

impl PriceSnapshot {
    pub fn is_empty(&self) -> bool {
        self.regular_price.is_empty()
            && self.promo_price.is_empty()
            && self.unit.is_empty()
            && self.discount_percent == 0
    }
}

/// Output of one successful fetch+extract. Never mutated after creation;
/// consumed by the history store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: String,
    pub title: String,
    pub unavailable: bool,
    pub availability_start: String,
    pub availability_end: String,
    pub prices: PriceSnapshot,
    pub unit_price: String,
    pub daily_limit: String,
    pub timestamp: String,
}

/// Terminal per-target failure, captured as data so one bad target never
/// aborts the rest of the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Non-2xx status after the transport's own retries were exhausted.
    Http(u16),
    /// Timeout, connection reset, or any other client-side failure.
    Transport(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Http(status) => write!(f, "HTTP error: {}", status),
            FetchError::Transport(detail) => write!(f, "transport error: {}", detail),
        }
    }
}

/// Per-target fetch outcome, emitted by the scheduler in completion order.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub id: String,
    pub outcome: Result<ProductRecord, FetchError>,
}

/// One entry in a product's price history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: String,
    #[serde(flatten)]
    pub prices: PriceSnapshot,
}

/// The persisted, evolving record for one product ID. Title and the
/// availability window always reflect the latest successful observation;
/// history is append-only and deduplicated against its last entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductEntity {
    pub id: String,
    pub title: String,
    pub availability_start: String,
    pub availability_end: String,
    pub history: Vec<PricePoint>,
}

impl ProductEntity {
    pub fn last_snapshot(&self) -> Option<&PriceSnapshot> {
        self.history.last().map(|point| &point.prices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_equality_is_field_wise() {
        let a = PriceSnapshot {
            regular_price: "10.00".to_string(),
            promo_price: "8.00".to_string(),
            unit: "/kg".to_string(),
            discount_percent: 20,
        };
        let mut b = a.clone();
        assert_eq!(a, b);

        b.discount_percent = 25;
        assert_ne!(a, b);
    }

    #[test]
    fn test_empty_snapshot() {
        assert!(PriceSnapshot::default().is_empty());
        let snapshot = PriceSnapshot {
            unit: "/kg".to_string(),
            ..Default::default()
        };
        assert!(!snapshot.is_empty());
    }

    #[test]
    fn test_price_point_serializes_flat() {
        let point = PricePoint {
            timestamp: "2025-03-01 12:00:00".to_string(),
            prices: PriceSnapshot {
                regular_price: "10.00".to_string(),
                promo_price: "".to_string(),
                unit: "/kg".to_string(),
                discount_percent: 0,
            },
        };

        let json = serde_json::to_value(&point).unwrap();
        assert_eq!(json["timestamp"], "2025-03-01 12:00:00");
        assert_eq!(json["regular_price"], "10.00");
        assert_eq!(json["unit"], "/kg");
    }
}
