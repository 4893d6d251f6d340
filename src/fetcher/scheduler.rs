use futures::stream::{self, StreamExt};
use std::future::Future;
use std::time::Instant;
use tracing::info;

/// Run one future per target with at most `concurrency` in flight, invoking
/// `on_complete` with the completed count as results drain. Results are
/// collected in completion order, which is unspecified relative to
/// submission order. A failing target only contributes its own result;
/// the rest of the batch keeps going.
pub async fn run_bounded<T, F, Fut, R, P>(
    targets: Vec<T>,
    concurrency: usize,
    each: F,
    mut on_complete: P,
) -> Vec<R>
where
    F: FnMut(T) -> Fut,
    Fut: Future<Output = R>,
    P: FnMut(usize),
{
    let mut results = Vec::with_capacity(targets.len());
    let mut in_flight = stream::iter(targets)
        .map(each)
        .buffer_unordered(concurrency.max(1));

    while let Some(result) = in_flight.next().await {
        results.push(result);
        on_complete(results.len());
    }

    results
}

/// Periodic completed/total + ETA logging for long scans.
pub struct Progress {
    label: &'static str,
    total: usize,
    every: usize,
    started: Instant,
}

impl Progress {
    pub fn new(label: &'static str, total: usize, every: usize) -> Self {
        Self {
            label,
            total,
            every: every.max(1),
            started: Instant::now(),
        }
    }

    pub fn tick(&self, completed: usize) {
        if completed == 0 || (completed % self.every != 0 && completed != self.total) {
            return;
        }

        let elapsed = self.started.elapsed();
        let remaining = self.total.saturating_sub(completed);
        let eta = elapsed / completed as u32 * remaining as u32;
        info!(
            "{}: {}/{} done, elapsed {:.0?}, ETA {:.0?}",
            self.label, completed, self.total, elapsed, eta
        );
    }
}
