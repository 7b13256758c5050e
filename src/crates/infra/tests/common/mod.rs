#![allow(dead_code)]

use domain::media_item::MediaItem;
use domain::performer::Performer;
use domain::value::{MediaItemId, PerformerId};
use config::{File, FileFormat};
use infra::repository::postgres::schema;
use infra::AppConfigImpl;
use infra::{CatalogRepository, TxExecutor, UnitOfWork};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tokio::sync::Mutex;

// Concurrent CREATE TABLE IF NOT EXISTS can still collide in PostgreSQL.
static SCHEMA_READY: Mutex<bool> = Mutex::const_new(false);

/// In-memory SQLite with a single connection, so every unit of work queues
/// behind the one holding the connection.
pub async fn sqlite_repository() -> CatalogRepository {
    let mut opt = ConnectOptions::new("sqlite::memory:".to_string());
    opt.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await.unwrap();
    schema::create_tables(&db).await.unwrap();
    CatalogRepository::new(TxExecutor::new(db))
}

/// Application configuration with nothing but the built-in defaults.
pub fn default_config() -> AppConfigImpl {
    AppConfigImpl::load_from(File::from_str("", FileFormat::Toml)).unwrap()
}

/// A pool sized like the production default.
pub async fn postgres_connection(url: &str) -> DatabaseConnection {
    let mut opt = ConnectOptions::new(url.to_string());
    opt.max_connections(default_config().database().max_connections)
        .sqlx_logging(false);
    let db = Database::connect(opt).await.unwrap();
    let mut ready = SCHEMA_READY.lock().await;
    if !*ready {
        schema::create_tables(&db).await.unwrap();
        *ready = true;
    }
    db
}

pub async fn seed_performer(repo: &CatalogRepository, id: i64, name: &str) -> Performer {
    let performer = Performer::new(PerformerId::from(id), name);
    repo.create_performer(&UnitOfWork::new(), &performer)
        .await
        .unwrap();
    performer
}

pub async fn seed_media_item(
    repo: &CatalogRepository,
    id: i64,
    title: &str,
    owner: &Performer,
) -> MediaItem {
    let item = MediaItem::new(MediaItemId::from(id), title, owner.id);
    repo.add_media_item(&UnitOfWork::new(), &item).await.unwrap();
    item
}

pub async fn play_count(repo: &CatalogRepository, id: MediaItemId) -> i64 {
    let filter = domain::media_item::MediaItemFilter {
        ids: vec![id],
        ..Default::default()
    };
    let items = repo
        .list_media_items(&UnitOfWork::new(), &filter)
        .await
        .unwrap();
    items.first().map(|item| item.play_count).unwrap_or(-1)
}
