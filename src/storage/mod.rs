pub mod history_store;
pub mod target_list;

pub use history_store::{HistoryStore, MergeStats};
pub use target_list::{load_targets, save_targets};
