use crate::repository::postgres::catalog::CatalogRepository;
use crate::repository::postgres::db_data::performer as db;
use crate::repository::postgres::error::StoreError;
use crate::repository::postgres::unit_of_work::UnitOfWork;
use domain::performer::Performer;
use sea_orm::*;

impl CatalogRepository {
    pub async fn create_performer(
        &self,
        uow: &UnitOfWork,
        performer: &Performer,
    ) -> Result<(), StoreError> {
        self.executor
            .run_atomic(uow, |uow| async move {
                let conn = self.executor.connection_for(&uow);
                let active_model: db::ActiveModel = performer.into();
                db::Entity::insert(active_model).exec(&conn).await?;
                Ok(())
            })
            .await
    }
}
