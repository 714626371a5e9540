use std::time::Duration;

/// Default number of tables processed concurrently within a dataset.
pub const DEFAULT_TABLE_CONCURRENCY: usize = 16;

/// Default delay between two polls of the same job.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Tuning knobs for a masking run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Upper bound on tables prepared, submitted or awaited at the same time.
    pub table_concurrency: usize,
    pub poll_interval: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            table_concurrency: DEFAULT_TABLE_CONCURRENCY,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl RunOptions {
    /// Set the table concurrency. Zero is treated as one.
    #[must_use]
    pub fn with_table_concurrency(mut self, concurrency: usize) -> Self {
        self.table_concurrency = concurrency.max(1);
        self
    }

    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}
