use sea_orm::error::SqlxError;
use sea_orm::{DbErr, RuntimeErr};
use thiserror::Error;

/// SQLSTATE codes after which re-running the whole unit of work can succeed.
const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("error begin transaction: {0}")]
    Begin(#[source] DbErr),

    #[error("error commit transaction: {0}")]
    Commit(#[source] DbErr),

    #[error("error execute transactional operation: {0}")]
    Aborted(#[source] Box<StoreError>),

    /// The unit of work failed and rolling it back failed too. Both causes are kept.
    #[error("error rollback transaction: {rollback}; after: {cause}")]
    Rollback {
        rollback: DbErr,
        #[source]
        cause: Box<StoreError>,
    },

    /// Failure inside a unit of work that joined a transaction opened by a caller.
    #[error("error perform operation in inherited transaction: {0}")]
    Inherited(#[source] Box<StoreError>),

    #[error("data access error: {0}")]
    Statement(#[from] DbErr),

    #[error("media item {media_item_id} owned by performer {performer_id} not found")]
    MediaItemNotFound {
        media_item_id: i64,
        performer_id: i64,
    },

    #[error("unit of work deadline exceeded")]
    DeadlineExceeded,

    #[error("transaction handle still in use when the unit of work ended")]
    Leaked,
}

impl StoreError {
    /// The innermost error, skipping the transaction lifecycle wrappers.
    pub fn root_cause(&self) -> &StoreError {
        match self {
            StoreError::Aborted(inner) | StoreError::Inherited(inner) => inner.root_cause(),
            StoreError::Rollback { cause, .. } => cause.root_cause(),
            other => other,
        }
    }

    /// Whether the store aborted the transaction because of a concurrent update
    /// (serialization failure or deadlock). Such a unit of work may be re-run.
    pub fn is_serialization_failure(&self) -> bool {
        match self.root_cause() {
            StoreError::Statement(err) | StoreError::Commit(err) => is_retryable_db_err(err),
            _ => false,
        }
    }
}

fn is_retryable_db_err(err: &DbErr) -> bool {
    let runtime = match err {
        DbErr::Exec(runtime) | DbErr::Query(runtime) | DbErr::Conn(runtime) => runtime,
        _ => return false,
    };
    match runtime {
        RuntimeErr::SqlxError(SqlxError::Database(db_err)) => matches!(
            db_err.code().as_deref(),
            Some(SERIALIZATION_FAILURE) | Some(DEADLOCK_DETECTED)
        ),
        _ => false,
    }
}
