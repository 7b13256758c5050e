use crate::repository::postgres::catalog::CatalogRepository;
use crate::repository::postgres::db_data::media_item as db;
use crate::repository::postgres::error::StoreError;
use crate::repository::postgres::filter::FilterBuilder;
use crate::repository::postgres::unit_of_work::UnitOfWork;
use domain::media_item::{MediaItem, MediaItemFilter};
use sea_orm::*;

impl CatalogRepository {
    pub async fn list_media_items(
        &self,
        uow: &UnitOfWork,
        filter: &MediaItemFilter,
    ) -> Result<Vec<MediaItem>, StoreError> {
        self.executor
            .run_atomic(uow, |uow| async move {
                let conn = self.executor.connection_for(&uow);
                let rows: Vec<db::Model> = FilterBuilder::<db::Entity>::find()
                    .id_in(db::Column::Id, filter.ids.iter().map(|id| id.as_i64()))
                    .text_eq(db::Column::Title, filter.title.as_deref())
                    .after(db::Column::Id, filter.from_id.map(|id| id.as_i64()))
                    .build()
                    .order_by_asc(db::Column::Id)
                    .all(&conn)
                    .await?;
                Ok(rows.into_iter().map(MediaItem::from).collect())
            })
            .await
    }
}
