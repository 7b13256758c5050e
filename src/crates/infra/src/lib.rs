pub mod config;
pub use config::{AppConfigImpl, CacheConfig, DatabaseConfig, LogConfig, ServerConfig};

pub mod id_generator;
pub use id_generator::SnowflakeIdGenerator;

pub mod repository;
pub use repository::postgres::{CatalogRepository, StoreError, TxExecutor, UnitOfWork};
