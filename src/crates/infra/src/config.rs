use crate::repository::postgres::catalog::DEFAULT_SERIALIZATION_ATTEMPTS;
use config::{Config, Environment, File, Source};
use dotenvy::dotenv;
use serde::Deserialize;
use std::error::Error;
use std::time::Duration;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RawConfig {
    database: RawDatabaseConfig,
    /// 缓存配置（核心逻辑不使用）
    cache: RawCacheConfig,
    server: RawServerConfig,
    log: RawLogConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawDatabaseConfig {
    host: String,
    database: String,
    user: String,
    secret: String,
    enable_tls: bool,
    /// 启动时按实体定义建表
    bootstrap_schema: bool,
    max_connections: u32,
    /// 序列化冲突时整个事务的最大尝试次数（安全上限，实际以请求截止时间为准）
    serialization_attempts: u32,
}

impl Default for RawDatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost:5432".to_string(),
            database: "playledger".to_string(),
            user: "postgres".to_string(),
            secret: "".to_string(),
            enable_tls: false,
            bootstrap_schema: false,
            max_connections: 20,
            serialization_attempts: DEFAULT_SERIALIZATION_ATTEMPTS,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RawCacheConfig {
    host: String,
    user: String,
    secret: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawServerConfig {
    host: String,
    port: u16,
    /// 单个请求（含其事务）的最长耗时
    request_timeout_secs: u64,
    /// 雪花算法节点ID
    node_id: i64,
}

impl Default for RawServerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3312,
            request_timeout_secs: 30,
            node_id: 1,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawLogConfig {
    level: String,
    file: String,
}

impl Default for RawLogConfig {
    fn default() -> Self {
        Self {
            level: "debug".to_string(),
            file: "".to_string(),
        }
    }
}

/// 数据库配置
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub database: String,
    pub user: String,
    pub secret: String,
    pub enable_tls: bool,
    pub bootstrap_schema: bool,
    pub max_connections: u32,
    pub serialization_attempts: u32,
}

impl DatabaseConfig {
    pub fn ssl_mode(&self) -> &'static str {
        if self.enable_tls {
            "require"
        } else {
            "disable"
        }
    }

    pub fn url(&self) -> String {
        format!(
            "postgresql://{}:{}@{}/{}?sslmode={}",
            self.user,
            self.secret,
            self.host,
            self.database,
            self.ssl_mode()
        )
    }

    /// Connection target with the credential masked, for logs.
    pub fn redacted_url(&self) -> String {
        format!(
            "postgresql://{}:***@{}/{}?sslmode={}",
            self.user,
            self.host,
            self.database,
            self.ssl_mode()
        )
    }
}

/// 缓存配置，目前仅解析，不参与数据访问
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub host: String,
    pub user: String,
    pub secret: String,
}

/// 服务器配置
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout: Duration,
    pub node_id: i64,
}

/// 日志配置
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: String,
    /// 为空时只输出到控制台
    pub file: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfigImpl {
    database: DatabaseConfig,
    cache: CacheConfig,
    server: ServerConfig,
    log: LogConfig,
}

impl AppConfigImpl {
    fn new(data: RawConfig) -> Self {
        let database = DatabaseConfig {
            host: data.database.host,
            database: data.database.database,
            user: data.database.user,
            secret: data.database.secret,
            enable_tls: data.database.enable_tls,
            bootstrap_schema: data.database.bootstrap_schema,
            max_connections: data.database.max_connections.max(1),
            serialization_attempts: data.database.serialization_attempts.max(1),
        };
        let cache = CacheConfig {
            host: data.cache.host,
            user: data.cache.user,
            secret: data.cache.secret,
        };
        let server = ServerConfig {
            host: data.server.host,
            port: data.server.port,
            request_timeout: Duration::from_secs(data.server.request_timeout_secs.max(1)),
            node_id: data.server.node_id,
        };
        let log = LogConfig {
            level: data.log.level,
            file: Some(data.log.file).filter(|f| !f.trim().is_empty()),
        };
        AppConfigImpl {
            database,
            cache,
            server,
            log,
        }
    }

    /// 加载顺序：.env → config.toml（可选）→ APP__* 环境变量
    pub fn load() -> Result<AppConfigImpl, Box<dyn Error>> {
        dotenv().ok();
        Self::load_from(File::with_name("config").required(false))
    }

    pub fn load_from<S>(source: S) -> Result<AppConfigImpl, Box<dyn Error>>
    where
        S: Source + Send + Sync + 'static,
    {
        let config = Config::builder()
            .add_source(source)
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?;

        let raw: RawConfig = config.try_deserialize()?; // serde 自动填充默认值
        Ok(AppConfigImpl::new(raw))
    }

    pub fn database(&self) -> &DatabaseConfig {
        &self.database
    }

    pub fn cache(&self) -> &CacheConfig {
        &self.cache
    }

    pub fn server(&self) -> &ServerConfig {
        &self.server
    }

    pub fn log(&self) -> &LogConfig {
        &self.log
    }

    pub fn database_url(&self) -> String {
        self.database.url()
    }
}
