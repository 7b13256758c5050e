use super::error::StoreError;
use async_trait::async_trait;
use log::{debug, warn};
use rand::Rng;
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbBackend, DbErr, ExecResult,
    IsolationLevel, QueryResult, Statement, TransactionTrait,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Request-scoped data-access context.
///
/// Every repository call takes one by reference. A detached unit of work
/// carries no transaction; the executor attaches one for the duration of a
/// top-level call and hands nested calls a clone, so they join it instead of
/// beginning their own. The deadline, if any, is inherited by every nested
/// unit of work.
#[derive(Clone, Default)]
pub struct UnitOfWork {
    txn: Option<Arc<DatabaseTransaction>>,
    deadline: Option<Instant>,
}

impl UnitOfWork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            txn: None,
            deadline: Some(deadline),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn in_transaction(&self) -> bool {
        self.txn.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}

impl std::fmt::Debug for UnitOfWork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitOfWork")
            .field("in_transaction", &self.in_transaction())
            .field("deadline", &self.deadline)
            .finish()
    }
}

/// The handle a statement runs on: the ambient transaction or the pool.
pub enum Conn<'a> {
    Pool(&'a DatabaseConnection),
    Txn(&'a DatabaseTransaction),
}

#[async_trait]
impl ConnectionTrait for Conn<'_> {
    fn get_database_backend(&self) -> DbBackend {
        match self {
            Conn::Pool(db) => db.get_database_backend(),
            Conn::Txn(txn) => txn.get_database_backend(),
        }
    }

    async fn execute(&self, stmt: Statement) -> Result<ExecResult, DbErr> {
        match self {
            Conn::Pool(db) => db.execute(stmt).await,
            Conn::Txn(txn) => txn.execute(stmt).await,
        }
    }

    async fn execute_unprepared(&self, sql: &str) -> Result<ExecResult, DbErr> {
        match self {
            Conn::Pool(db) => db.execute_unprepared(sql).await,
            Conn::Txn(txn) => txn.execute_unprepared(sql).await,
        }
    }

    async fn query_one(&self, stmt: Statement) -> Result<Option<QueryResult>, DbErr> {
        match self {
            Conn::Pool(db) => db.query_one(stmt).await,
            Conn::Txn(txn) => txn.query_one(stmt).await,
        }
    }

    async fn query_all(&self, stmt: Statement) -> Result<Vec<QueryResult>, DbErr> {
        match self {
            Conn::Pool(db) => db.query_all(stmt).await,
            Conn::Txn(txn) => txn.query_all(stmt).await,
        }
    }

    fn is_mock_connection(&self) -> bool {
        match self {
            Conn::Pool(db) => db.is_mock_connection(),
            Conn::Txn(txn) => txn.is_mock_connection(),
        }
    }
}

/// Owns the pool and decides, per call tree, where a transaction begins and ends.
#[derive(Clone)]
pub struct TxExecutor {
    db: DatabaseConnection,
}

impl TxExecutor {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// The handle every statement must run on for `uow`.
    pub fn connection_for<'a>(&'a self, uow: &'a UnitOfWork) -> Conn<'a> {
        match uow.txn.as_deref() {
            Some(txn) => Conn::Txn(txn),
            None => Conn::Pool(&self.db),
        }
    }

    /// Runs `work` atomically.
    ///
    /// Inside an already-active unit of work this only participates: no
    /// begin, no commit, no rollback, and errors come back as
    /// [`StoreError::Inherited`]. Otherwise a REPEATABLE READ transaction is
    /// opened, `work` runs on it, and the outcome decides commit or rollback.
    pub async fn run_atomic<T, F, Fut>(&self, uow: &UnitOfWork, work: F) -> Result<T, StoreError>
    where
        F: FnOnce(UnitOfWork) -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        if uow.in_transaction() {
            return within_deadline(uow.deadline, work(uow.clone()))
                .await
                .map_err(|e| StoreError::Inherited(Box::new(e)));
        }

        let txn = self.begin().await?;
        let scoped = UnitOfWork {
            txn: Some(Arc::clone(&txn)),
            deadline: uow.deadline,
        };
        let outcome = within_deadline(uow.deadline, work(scoped)).await;
        finish(txn, outcome).await
    }

    /// Like [`run_atomic`](Self::run_atomic), but a top-level unit of work
    /// that the store aborts with a serialization failure is re-run from
    /// scratch until it succeeds, the deadline of `uow` is reached, or
    /// `attempts` runs have been made. Re-runs are spaced by jittered
    /// exponential backoff. Nested calls never retry; the outermost caller
    /// owns that decision.
    pub async fn run_serialized<T, F, Fut>(
        &self,
        uow: &UnitOfWork,
        attempts: u32,
        work: F,
    ) -> Result<T, StoreError>
    where
        F: Fn(UnitOfWork) -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        if uow.in_transaction() {
            return self.run_atomic(uow, work).await;
        }

        let attempts = attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.run_atomic(uow, &work).await {
                Err(err) if err.is_serialization_failure() => {
                    match next_retry(attempt, attempts, uow.deadline, Instant::now()) {
                        Retry::After(delay) => {
                            debug!(
                                "unit of work aborted by concurrent update, retrying in {:?} (attempt {}): {}",
                                delay, attempt, err
                            );
                            tokio::time::sleep(delay).await;
                            attempt += 1;
                        }
                        Retry::DeadlineReached => {
                            warn!(
                                "unit of work still conflicting after {} attempts, deadline reached: {}",
                                attempt, err
                            );
                            return Err(StoreError::DeadlineExceeded);
                        }
                        Retry::Exhausted => {
                            warn!("unit of work gave up after {} attempts: {}", attempt, err);
                            return Err(err);
                        }
                    }
                }
                result => return result,
            }
        }
    }

    async fn begin(&self) -> Result<Arc<DatabaseTransaction>, StoreError> {
        let txn = self
            .db
            .begin_with_config(Some(IsolationLevel::RepeatableRead), None)
            .await
            .map_err(StoreError::Begin)?;
        debug!("transaction begun");
        Ok(Arc::new(txn))
    }
}

const RETRY_BASE_DELAY: Duration = Duration::from_millis(2);
const RETRY_MAX_DELAY: Duration = Duration::from_millis(250);

#[derive(Debug, PartialEq)]
enum Retry {
    After(Duration),
    DeadlineReached,
    Exhausted,
}

/// What to do after attempt number `attempt` (1-based) hit a serialization failure.
fn next_retry(attempt: u32, attempts: u32, deadline: Option<Instant>, now: Instant) -> Retry {
    if attempt >= attempts {
        return Retry::Exhausted;
    }
    let delay = backoff(attempt);
    match deadline {
        Some(deadline) if now + delay >= deadline => Retry::DeadlineReached,
        _ => Retry::After(delay),
    }
}

/// Exponential ceiling with the lower half fixed and the upper half random,
/// so colliding writers spread out instead of waking together.
fn backoff(attempt: u32) -> Duration {
    let ceiling = RETRY_BASE_DELAY
        .saturating_mul(1 << attempt.saturating_sub(1).min(16))
        .min(RETRY_MAX_DELAY);
    let half = ceiling / 2;
    let jitter = rand::thread_rng().gen_range(0..=half.as_micros() as u64);
    half + Duration::from_micros(jitter)
}

async fn within_deadline<T, Fut>(deadline: Option<Instant>, fut: Fut) -> Result<T, StoreError>
where
    Fut: Future<Output = Result<T, StoreError>>,
{
    match deadline {
        Some(deadline) => tokio::time::timeout_at(deadline, fut)
            .await
            .unwrap_or(Err(StoreError::DeadlineExceeded)),
        None => fut.await,
    }
}

/// Commits or rolls back, consuming the only remaining reference to the transaction.
async fn finish<T>(
    txn: Arc<DatabaseTransaction>,
    outcome: Result<T, StoreError>,
) -> Result<T, StoreError> {
    let txn = match Arc::try_unwrap(txn) {
        Ok(txn) => txn,
        Err(_) => {
            // Someone kept a clone of the unit of work; sea-orm rolls back on drop.
            warn!("transaction handle outlived its unit of work, rolling back");
            return Err(StoreError::Leaked);
        }
    };

    match outcome {
        Ok(value) => {
            txn.commit().await.map_err(StoreError::Commit)?;
            debug!("transaction committed");
            Ok(value)
        }
        Err(err) => match txn.rollback().await {
            Ok(()) => {
                debug!("transaction rolled back: {}", err);
                Err(StoreError::Aborted(Box::new(err)))
            }
            Err(rollback) => {
                warn!("rollback failed: {}", rollback);
                Err(StoreError::Rollback {
                    rollback,
                    cause: Box::new(err),
                })
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::postgres::{schema, CatalogRepository};
    use domain::performer::{Performer, PerformerFilter};
    use domain::value::PerformerId;
    use sea_orm::{ConnectOptions, Database};

    async fn sqlite_executor() -> TxExecutor {
        let mut opt = ConnectOptions::new("sqlite::memory:".to_string());
        opt.max_connections(1).min_connections(1).sqlx_logging(false);
        let db = Database::connect(opt).await.unwrap();
        schema::create_tables(&db).await.unwrap();
        TxExecutor::new(db)
    }

    async fn performer_count(repo: &CatalogRepository) -> usize {
        repo.list_performers(&UnitOfWork::new(), &PerformerFilter::default())
            .await
            .unwrap()
            .len()
    }

    #[test]
    fn test_detached_unit_of_work() {
        let uow = UnitOfWork::new();
        assert!(!uow.in_transaction());
        assert!(uow.deadline().is_none());
        assert!(UnitOfWork::with_timeout(Duration::from_secs(1))
            .deadline()
            .is_some());
    }

    #[tokio::test]
    async fn test_connection_for_detached_is_pool() {
        let executor = sqlite_executor().await;
        let uow = UnitOfWork::new();
        assert!(matches!(executor.connection_for(&uow), Conn::Pool(_)));
    }

    #[tokio::test]
    async fn test_work_sees_active_transaction() {
        let executor = sqlite_executor().await;
        let executor_ref = &executor;
        let in_txn = executor
            .run_atomic(&UnitOfWork::new(), |uow| async move {
                Ok(uow.in_transaction()
                    && matches!(executor_ref.connection_for(&uow), Conn::Txn(_)))
            })
            .await
            .unwrap();
        assert!(in_txn);
    }

    #[tokio::test]
    async fn test_commit_on_success() {
        let executor = sqlite_executor().await;
        let repo = CatalogRepository::new(executor.clone());
        let repo_ref = &repo;

        executor
            .run_atomic(&UnitOfWork::new(), |uow| async move {
                repo_ref
                    .create_performer(&uow, &Performer::new(PerformerId::from(1), "Alice"))
                    .await?;
                repo_ref
                    .create_performer(&uow, &Performer::new(PerformerId::from(2), "Bob"))
                    .await
            })
            .await
            .unwrap();

        assert_eq!(performer_count(&repo).await, 2);
    }

    #[tokio::test]
    async fn test_failure_on_second_insert_rolls_back_both() {
        let executor = sqlite_executor().await;
        let repo = CatalogRepository::new(executor.clone());
        let repo_ref = &repo;
        let alice = Performer::new(PerformerId::from(1), "Alice");

        let err = executor
            .run_atomic(&UnitOfWork::new(), |uow| async move {
                repo_ref.create_performer(&uow, &alice).await?;
                // same primary key again
                repo_ref.create_performer(&uow, &alice).await
            })
            .await
            .unwrap_err();

        match err {
            StoreError::Aborted(inner) => {
                assert!(matches!(*inner, StoreError::Inherited(_)), "{}", inner)
            }
            other => panic!("unexpected error: {}", other),
        }
        assert_eq!(performer_count(&repo).await, 0);
    }

    #[tokio::test]
    async fn test_nested_call_joins_outer_transaction() {
        let executor = sqlite_executor().await;
        let repo = CatalogRepository::new(executor.clone());
        let repo_ref = &repo;

        // The inner insert succeeds; only the outer decision counts.
        let err = executor
            .run_atomic(&UnitOfWork::new(), |uow| async move {
                repo_ref
                    .create_performer(&uow, &Performer::new(PerformerId::from(7), "Carol"))
                    .await?;
                let nested_saw_txn = repo_ref
                    .executor()
                    .run_atomic(&uow, |inner| async move { Ok(inner.in_transaction()) })
                    .await?;
                assert!(nested_saw_txn);
                Err::<(), _>(StoreError::DeadlineExceeded)
            })
            .await
            .unwrap_err();

        assert!(matches!(err.root_cause(), StoreError::DeadlineExceeded));
        assert_eq!(performer_count(&repo).await, 0);
    }

    #[tokio::test]
    async fn test_nested_error_is_marked_inherited() {
        let executor = sqlite_executor().await;
        let executor_ref = &executor;

        let err = executor
            .run_atomic(&UnitOfWork::new(), |uow| async move {
                executor_ref
                    .run_atomic(&uow, |_| async { Err::<(), _>(StoreError::DeadlineExceeded) })
                    .await
            })
            .await
            .unwrap_err();

        match err {
            StoreError::Aborted(inner) => match *inner {
                StoreError::Inherited(cause) => {
                    assert!(matches!(*cause, StoreError::DeadlineExceeded))
                }
                other => panic!("unexpected inner error: {}", other),
            },
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_deadline_aborts_in_flight_work() {
        let executor = sqlite_executor().await;
        let repo = CatalogRepository::new(executor.clone());
        let repo_ref = &repo;
        let uow = UnitOfWork::with_timeout(Duration::from_millis(50));

        let err = executor
            .run_atomic(&uow, |uow| async move {
                repo_ref
                    .create_performer(&uow, &Performer::new(PerformerId::from(3), "Dave"))
                    .await?;
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await
            .unwrap_err();

        assert!(matches!(err.root_cause(), StoreError::DeadlineExceeded));
        assert_eq!(performer_count(&repo).await, 0);
    }

    #[tokio::test]
    async fn test_leaked_handle_is_reported() {
        let executor = sqlite_executor().await;

        let result = executor
            .run_atomic(&UnitOfWork::new(), |uow| async move { Ok(uow) })
            .await;

        assert!(matches!(result, Err(StoreError::Leaked)));
        // the pool is usable again once the leaked handle is gone
        let repo = CatalogRepository::new(executor);
        assert_eq!(performer_count(&repo).await, 0);
    }

    #[tokio::test]
    async fn test_serialized_does_not_retry_other_errors() {
        let executor = sqlite_executor().await;
        let calls = std::sync::atomic::AtomicU32::new(0);
        let calls_ref = &calls;

        let err = executor
            .run_serialized(&UnitOfWork::new(), 5, |_| async move {
                calls_ref.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                Err::<(), _>(StoreError::DeadlineExceeded)
            })
            .await
            .unwrap_err();

        assert!(matches!(err.root_cause(), StoreError::DeadlineExceeded));
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[test]
    fn test_backoff_grows_and_stays_bounded() {
        for attempt in 1..40 {
            let delay = backoff(attempt);
            assert!(delay <= RETRY_MAX_DELAY, "attempt {}: {:?}", attempt, delay);
            assert!(delay >= RETRY_BASE_DELAY / 2, "attempt {}: {:?}", attempt, delay);
        }
        assert!(backoff(1) <= RETRY_BASE_DELAY);
        assert!(backoff(30) >= RETRY_MAX_DELAY / 2);
    }

    #[test]
    fn test_retry_stops_at_deadline() {
        let now = Instant::now();
        assert_eq!(
            next_retry(1, 1000, Some(now), now),
            Retry::DeadlineReached
        );
        assert_eq!(
            next_retry(3, 1000, Some(now + Duration::from_millis(1)), now),
            Retry::DeadlineReached
        );
        assert!(matches!(
            next_retry(3, 1000, Some(now + Duration::from_secs(30)), now),
            Retry::After(_)
        ));
    }

    #[test]
    fn test_retry_without_deadline_is_capped_by_attempts() {
        let now = Instant::now();
        assert!(matches!(next_retry(999, 1000, None, now), Retry::After(_)));
        assert_eq!(next_retry(1000, 1000, None, now), Retry::Exhausted);
        assert_eq!(next_retry(1, 1, Some(now), now), Retry::Exhausted);
    }
}
