use super::unit_of_work::TxExecutor;

/// Safety cap on re-runs of a conflicting unit of work; the deadline of the
/// unit of work is the real bound.
pub const DEFAULT_SERIALIZATION_ATTEMPTS: u32 = 1000;

/// Performers, their media items and monthly play totals.
///
/// Queries live in `query::*`, commands in `command::*`. Every method wraps
/// its statements in a unit of work obtained from the executor, so callers
/// can compose several of them inside one transaction.
#[derive(Clone)]
pub struct CatalogRepository {
    pub(crate) executor: TxExecutor,
    pub(crate) serialization_attempts: u32,
}

impl CatalogRepository {
    pub fn new(executor: TxExecutor) -> Self {
        Self {
            executor,
            serialization_attempts: DEFAULT_SERIALIZATION_ATTEMPTS,
        }
    }

    pub fn with_serialization_attempts(mut self, attempts: u32) -> Self {
        self.serialization_attempts = attempts.max(1);
        self
    }

    pub fn executor(&self) -> &TxExecutor {
        &self.executor
    }
}
