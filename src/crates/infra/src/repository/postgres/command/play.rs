use crate::repository::postgres::catalog::CatalogRepository;
use crate::repository::postgres::db_data::{media_item as item_db, monthly_plays as plays_db};
use crate::repository::postgres::error::StoreError;
use crate::repository::postgres::unit_of_work::UnitOfWork;
use domain::value::PlayKey;
use log::debug;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::*;

impl CatalogRepository {
    /// Counts one play of `key.media_item_id` towards its own counter and the
    /// owner's total for `key.period`, both in one unit of work.
    ///
    /// Row locks are always taken aggregate first, item second, so two calls
    /// sharing either row queue up instead of deadlocking.
    pub async fn record_play(&self, uow: &UnitOfWork, key: PlayKey) -> Result<(), StoreError> {
        self.executor
            .run_serialized(uow, self.serialization_attempts, |uow| async move {
                let conn = self.executor.connection_for(&uow);
                let owner_id = key.performer_id.as_i64();
                let item_id = key.media_item_id.as_i64();

                // First play of the period creates the aggregate row at zero.
                plays_db::Entity::insert(plays_db::ActiveModel::empty(key.performer_id, key.period))
                    .on_conflict(
                        OnConflict::columns([
                            plays_db::Column::OwnerId,
                            plays_db::Column::Month,
                            plays_db::Column::Year,
                        ])
                        .do_nothing()
                        .to_owned(),
                    )
                    .exec_without_returning(&conn)
                    .await?;

                plays_db::Entity::find()
                    .filter(plays_db::key_condition(key.performer_id, key.period))
                    .lock_exclusive()
                    .one(&conn)
                    .await?;

                let item = item_db::Entity::find()
                    .filter(item_db::Column::Id.eq(item_id))
                    .filter(item_db::Column::OwnerId.eq(owner_id))
                    .lock_exclusive()
                    .one(&conn)
                    .await?;
                if item.is_none() {
                    return Err(StoreError::MediaItemNotFound {
                        media_item_id: item_id,
                        performer_id: owner_id,
                    });
                }

                plays_db::Entity::update_many()
                    .col_expr(
                        plays_db::Column::TotalPlays,
                        Expr::col((plays_db::Entity, plays_db::Column::TotalPlays)).add(1),
                    )
                    .filter(plays_db::key_condition(key.performer_id, key.period))
                    .exec(&conn)
                    .await?;

                item_db::Entity::update_many()
                    .col_expr(
                        item_db::Column::PlayCount,
                        Expr::col((item_db::Entity, item_db::Column::PlayCount)).add(1),
                    )
                    .filter(item_db::Column::Id.eq(item_id))
                    .filter(item_db::Column::OwnerId.eq(owner_id))
                    .exec(&conn)
                    .await?;

                debug!(
                    "recorded play of item {} for performer {} in {}",
                    item_id, owner_id, key.period
                );
                Ok(())
            })
            .await
    }
}
