use crate::repository::postgres::catalog::CatalogRepository;
use crate::repository::postgres::db_data::monthly_plays as db;
use crate::repository::postgres::error::StoreError;
use crate::repository::postgres::unit_of_work::UnitOfWork;
use domain::monthly_plays::MonthlyPlays;
use domain::value::{PerformerId, PlayPeriod};
use sea_orm::*;

impl CatalogRepository {
    /// Total plays of `performer_id` in `period`.
    ///
    /// `None` means no play was ever recorded for the key, which is not the
    /// same as `Some(0)`. Plain read, takes no row locks.
    pub async fn get_monthly_plays(
        &self,
        uow: &UnitOfWork,
        performer_id: PerformerId,
        period: PlayPeriod,
    ) -> Result<Option<i64>, StoreError> {
        let plays = self.find_monthly_plays(uow, performer_id, period).await?;
        Ok(plays.map(|p| p.total_plays))
    }

    pub async fn find_monthly_plays(
        &self,
        uow: &UnitOfWork,
        performer_id: PerformerId,
        period: PlayPeriod,
    ) -> Result<Option<MonthlyPlays>, StoreError> {
        self.executor
            .run_atomic(uow, |uow| async move {
                let conn = self.executor.connection_for(&uow);
                let row: Option<db::Model> = db::Entity::find()
                    .filter(db::key_condition(performer_id, period))
                    .one(&conn)
                    .await?;
                Ok(row.map(|row| MonthlyPlays {
                    owner_id: performer_id,
                    period,
                    total_plays: row.total_plays,
                }))
            })
            .await
    }
}
