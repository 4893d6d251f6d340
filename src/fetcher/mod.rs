pub mod id_prober;
pub mod product_fetcher;
pub mod scheduler;
pub mod transport;

pub use id_prober::IdProber;
pub use product_fetcher::ProductFetcher;
