pub mod error;
pub mod native_api;

use domain::id::IdGenerator;
use domain::DomainError;
use infra::config::{AppConfigImpl, DatabaseConfig};
use infra::id_generator::SnowflakeIdGenerator;
use infra::{CatalogRepository, TxExecutor, UnitOfWork};
use log::info;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, Statement};
use std::sync::Arc;
use std::time::Duration;

pub struct AppState {
    pub app_cfg: AppConfigImpl,
    pub repo: CatalogRepository,
    pub id_generator: Arc<dyn IdGenerator>,
}

impl AppState {
    pub async fn init_db(db_cfg: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
        let mut opt = ConnectOptions::new(db_cfg.url());
        opt.max_connections(db_cfg.max_connections)
            .min_connections(1)
            .connect_timeout(Duration::from_secs(3))
            .acquire_timeout(Duration::from_secs(8))
            .idle_timeout(Duration::from_secs(60))
            .max_lifetime(Duration::from_secs(300))
            .sqlx_logging(false)
            .sqlx_logging_level(log::LevelFilter::Info);

        info!("connecting to {}", db_cfg.redacted_url());
        let db = Database::connect(opt).await?;

        let backend = db.get_database_backend();
        db.execute(Statement::from_string(backend, "SELECT 1".to_owned()))
            .await?;

        info!("Database connection pool initialized successfully");
        Ok(db)
    }

    pub fn new(db: DatabaseConnection, app_cfg: AppConfigImpl) -> Result<Self, DomainError> {
        let id_generator: Arc<dyn IdGenerator> =
            Arc::new(SnowflakeIdGenerator::new(app_cfg.server().node_id)?);
        let repo = CatalogRepository::new(TxExecutor::new(db))
            .with_serialization_attempts(app_cfg.database().serialization_attempts);

        Ok(Self {
            app_cfg,
            repo,
            id_generator,
        })
    }

    /// 每个请求一个工作单元，截止时间来自 `server.request_timeout_secs`
    pub fn unit_of_work(&self) -> UnitOfWork {
        UnitOfWork::with_timeout(self.app_cfg.server().request_timeout)
    }
}
