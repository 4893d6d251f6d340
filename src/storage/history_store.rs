use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

use crate::models::{FetchResult, PricePoint, ProductEntity};

/// Counts for one merge pass, reported in the run summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Entities created for IDs not seen before.
    pub created: usize,
    /// History entries appended to existing entities.
    pub appended: usize,
    /// Existing entities whose observation brought no price change.
    pub unchanged: usize,
    /// Error results, excluded from the merge entirely.
    pub skipped: usize,
}

/// JSON-backed store for the persisted entity collection. The whole
/// collection is loaded before a run and rewritten after it; the rewrite
/// goes through a temp file + rename so a failed write leaves the previous
/// state intact.
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Load the persisted entities. A missing file means a fresh dataset;
    /// an unreadable or corrupt file is fatal for the run.
    pub fn load(&self) -> Result<Vec<ProductEntity>> {
        if !self.path.exists() {
            info!(
                "No dataset found at {}, starting fresh",
                self.path.display()
            );
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read dataset {}", self.path.display()))?;
        let entities = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse dataset {}", self.path.display()))?;
        Ok(entities)
    }

    /// Fold a batch of fetch results into the entity collection. Error
    /// results are skipped; a new ID creates an entity (with one history
    /// entry iff the product is available); an existing ID gets its title
    /// and availability window overwritten and a history entry appended iff
    /// the product is available and its snapshot differs from the last one.
    pub fn merge(entities: &mut Vec<ProductEntity>, results: &[FetchResult]) -> MergeStats {
        let mut index: HashMap<String, usize> = entities
            .iter()
            .enumerate()
            .map(|(position, entity)| (entity.id.clone(), position))
            .collect();
        let mut stats = MergeStats::default();

        for result in results {
            let record = match &result.outcome {
                Ok(record) => record,
                Err(_) => {
                    stats.skipped += 1;
                    continue;
                }
            };

            match index.get(&record.id) {
                Some(&position) => {
                    let entity = &mut entities[position];
                    entity.title = record.title.clone();
                    entity.availability_start = record.availability_start.clone();
                    entity.availability_end = record.availability_end.clone();

                    if !record.unavailable && entity.last_snapshot() != Some(&record.prices) {
                        entity.history.push(PricePoint {
                            timestamp: record.timestamp.clone(),
                            prices: record.prices.clone(),
                        });
                        stats.appended += 1;
                    } else {
                        stats.unchanged += 1;
                    }
                }
                None => {
                    let mut entity = ProductEntity {
                        id: record.id.clone(),
                        title: record.title.clone(),
                        availability_start: record.availability_start.clone(),
                        availability_end: record.availability_end.clone(),
                        history: Vec::new(),
                    };
                    if !record.unavailable {
                        entity.history.push(PricePoint {
                            timestamp: record.timestamp.clone(),
                            prices: record.prices.clone(),
                        });
                    }
                    index.insert(record.id.clone(), entities.len());
                    entities.push(entity);
                    stats.created += 1;
                }
            }
        }

        stats
    }

    /// Persist the full collection, replacing the previous file atomically.
    pub fn save(&self, entities: &[ProductEntity]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create dataset directory {}", parent.display())
                })?;
            }
        }

        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "dataset".to_string());
        let tmp_path = self
            .path
            .with_file_name(format!("{}.{}.tmp", file_name, Uuid::new_v4()));

        let json = serde_json::to_string_pretty(entities)?;
        if let Err(e) = fs::write(&tmp_path, json)
            .and_then(|_| fs::rename(&tmp_path, &self.path))
        {
            let _ = fs::remove_file(&tmp_path);
            return Err(e)
                .with_context(|| format!("failed to persist dataset {}", self.path.display()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FetchError, PriceSnapshot, ProductRecord};

    fn record(id: &str, regular: &str, discount: u32, timestamp: &str) -> ProductRecord {
        let prices = PriceSnapshot {
            regular_price: regular.to_string(),
            promo_price: if discount > 0 { "x".to_string() } else { String::new() },
            unit: "/kg".to_string(),
            discount_percent: discount,
        };
        ProductRecord {
            id: id.to_string(),
            title: format!("Product {}", id),
            unavailable: false,
            availability_start: "01.03".to_string(),
            availability_end: "07.03".to_string(),
            prices,
            unit_price: String::new(),
            daily_limit: String::new(),
            timestamp: timestamp.to_string(),
        }
    }

    fn ok(record: ProductRecord) -> FetchResult {
        FetchResult {
            id: record.id.clone(),
            outcome: Ok(record),
        }
    }

    #[test]
    fn test_new_available_product_creates_entity_with_one_entry() {
        let mut entities = Vec::new();
        let stats = HistoryStore::merge(&mut entities, &[ok(record("1", "10.00", 0, "t1"))]);

        assert_eq!(stats.created, 1);
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].history.len(), 1);
        assert_eq!(entities[0].history[0].timestamp, "t1");
    }

    #[test]
    fn test_new_unavailable_product_creates_entity_without_history() {
        let mut unavailable = record("1", "", 0, "t1");
        unavailable.unavailable = true;
        unavailable.prices = PriceSnapshot::default();

        let mut entities = Vec::new();
        let stats = HistoryStore::merge(&mut entities, &[ok(unavailable)]);

        assert_eq!(stats.created, 1);
        assert!(entities[0].history.is_empty());
    }

    #[test]
    fn test_unchanged_snapshot_appends_nothing() {
        let mut entities = Vec::new();
        HistoryStore::merge(&mut entities, &[ok(record("1", "10.00", 0, "t1"))]);
        let stats = HistoryStore::merge(&mut entities, &[ok(record("1", "10.00", 0, "t2"))]);

        assert_eq!(stats.appended, 0);
        assert_eq!(stats.unchanged, 1);
        assert_eq!(entities[0].history.len(), 1);
    }

    #[test]
    fn test_changed_snapshot_appends_with_new_timestamp() {
        let mut entities = Vec::new();
        HistoryStore::merge(&mut entities, &[ok(record("1", "10.00", 0, "t1"))]);
        let stats = HistoryStore::merge(&mut entities, &[ok(record("1", "12.00", 0, "t2"))]);

        assert_eq!(stats.appended, 1);
        assert_eq!(entities[0].history.len(), 2);
        assert_eq!(entities[0].history[1].timestamp, "t2");
        assert_eq!(entities[0].history[1].prices.regular_price, "12.00");
    }

    #[test]
    fn test_merge_is_idempotent_for_a_repeated_batch() {
        let batch = vec![
            ok(record("1", "10.00", 20, "t1")),
            ok(record("2", "4.50", 0, "t1")),
        ];

        let mut entities = Vec::new();
        HistoryStore::merge(&mut entities, &batch);
        let snapshot = serde_json::to_string(&entities).unwrap();

        let stats = HistoryStore::merge(&mut entities, &batch);
        assert_eq!(stats.appended, 0);
        assert_eq!(stats.created, 0);
        assert_eq!(serde_json::to_string(&entities).unwrap(), snapshot);
    }

    #[test]
    fn test_unavailable_observation_updates_window_but_not_history() {
        let mut entities = Vec::new();
        HistoryStore::merge(&mut entities, &[ok(record("1", "10.00", 0, "t1"))]);

        let mut gone = record("1", "12.00", 0, "t2");
        gone.unavailable = true;
        gone.availability_start = "08.03".to_string();
        gone.availability_end = "14.03".to_string();
        HistoryStore::merge(&mut entities, &[ok(gone)]);

        assert_eq!(entities[0].availability_start, "08.03");
        assert_eq!(entities[0].history.len(), 1);
    }

    #[test]
    fn test_error_results_are_skipped() {
        let mut entities = Vec::new();
        let results = vec![
            FetchResult {
                id: "1".to_string(),
                outcome: Err(FetchError::Http(404)),
            },
            FetchResult {
                id: "2".to_string(),
                outcome: Err(FetchError::Transport("timeout".to_string())),
            },
        ];
        let stats = HistoryStore::merge(&mut entities, &results);

        assert_eq!(stats.skipped, 2);
        assert!(entities.is_empty());
    }

    #[test]
    fn test_title_is_overwritten_on_every_observation() {
        let mut entities = Vec::new();
        HistoryStore::merge(&mut entities, &[ok(record("1", "10.00", 0, "t1"))]);

        let mut renamed = record("1", "10.00", 0, "t2");
        renamed.title = "New title".to_string();
        HistoryStore::merge(&mut entities, &[ok(renamed)]);

        assert_eq!(entities[0].title, "New title");
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("products.json"));

        let mut entities = Vec::new();
        HistoryStore::merge(&mut entities, &[ok(record("1", "10.00", 20, "t1"))]);
        store.save(&entities).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, "1");
        assert_eq!(loaded[0].history.len(), 1);
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("absent.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_leaves_no_temp_files_behind() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("products.json"));
        store.save(&[]).unwrap();
        store.save(&[]).unwrap();

        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["products.json".to_string()]);
    }

    #[test]
    fn test_failed_write_leaves_previous_dataset_intact() {
        let dir = tempfile::tempdir().unwrap();
        // Name long enough that the temp-file suffix pushes it past the
        // filesystem's 255-byte name limit: the dataset itself fits, but
        // every temp write fails before the rename can happen.
        let path = dir.path().join(format!("{}.json", "a".repeat(245)));

        let mut entities = Vec::new();
        HistoryStore::merge(&mut entities, &[ok(record("1", "10.00", 0, "t1"))]);
        fs::write(&path, serde_json::to_string_pretty(&entities).unwrap()).unwrap();

        let store = HistoryStore::new(&path);
        let mut grown = entities.clone();
        HistoryStore::merge(&mut grown, &[ok(record("2", "4.50", 0, "t2"))]);
        assert!(store.save(&grown).is_err());

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, "1");
        assert_eq!(loaded[0].history.len(), 1);
    }

    #[test]
    fn test_unwritable_destination_is_an_error_not_a_panic() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();

        // The parent of the dataset path is a regular file, so the temp
        // write fails with a filesystem error.
        let store = HistoryStore::new(blocker.join("products.json"));
        assert!(store.save(&[]).is_err());
    }

    #[test]
    fn test_corrupt_dataset_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("products.json");
        fs::write(&path, "not json").unwrap();

        assert!(HistoryStore::new(&path).load().is_err());
    }
}
