use crate::repository::postgres::catalog::CatalogRepository;
use crate::repository::postgres::db_data::media_item as db;
use crate::repository::postgres::error::StoreError;
use crate::repository::postgres::unit_of_work::UnitOfWork;
use domain::media_item::MediaItem;
use sea_orm::*;

impl CatalogRepository {
    /// Inserts `item`; the store rejects an owner that does not exist.
    pub async fn add_media_item(&self, uow: &UnitOfWork, item: &MediaItem) -> Result<(), StoreError> {
        self.executor
            .run_atomic(uow, |uow| async move {
                let conn = self.executor.connection_for(&uow);
                let active_model: db::ActiveModel = item.into();
                db::Entity::insert(active_model).exec(&conn).await?;
                Ok(())
            })
            .await
    }
}
