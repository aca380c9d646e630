//! Progress reporting for a fetch cycle.
//!
//! Frontends implement this to surface batch completion to users; the
//! orchestrator calls it between batches. Methods take `&self` so one sink
//! can be shared across spawned work.

use tracing::info;

pub trait Progress: Send + Sync {
    /// Called once with the total number of fetch jobs.
    fn begin(&self, _total: usize) {}

    /// Called after each batch with jobs completed so far.
    fn batch_done(&self, _completed: usize, _total: usize) {}

    /// Called when the cycle's fetching is finished.
    fn finish(&self) {}
}

/// A no-op progress sink.
pub struct NullProgress;
impl Progress for NullProgress {}

/// Logs progress through tracing.
pub struct LogProgress;

impl Progress for LogProgress {
    fn begin(&self, total: usize) {
        info!(total, "fetching stock pages");
    }

    fn batch_done(&self, completed: usize, total: usize) {
        let pct = if total == 0 {
            100
        } else {
            completed * 100 / total
        };
        info!(completed, total, pct, "batch complete");
    }

    fn finish(&self) {
        info!("stock fetch complete");
    }
}
