use super::db_data::{media_item, monthly_plays, performer};
use log::info;
use sea_orm::{ConnectionTrait, DbErr, EntityTrait, Schema};

/// Creates the catalog tables from their entity definitions when missing.
///
/// Parents are created before children so foreign keys resolve.
pub async fn create_tables<C: ConnectionTrait>(db: &C) -> Result<(), DbErr> {
    let schema = Schema::new(db.get_database_backend());
    create_table(db, &schema, performer::Entity).await?;
    create_table(db, &schema, media_item::Entity).await?;
    create_table(db, &schema, monthly_plays::Entity).await?;
    Ok(())
}

async fn create_table<C, E>(db: &C, schema: &Schema, entity: E) -> Result<(), DbErr>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let table = entity.table_name().to_string();
    let mut stmt = schema.create_table_from_entity(entity);
    stmt.if_not_exists();
    db.execute(db.get_database_backend().build(&stmt)).await?;
    info!("table {} is ready", table);
    Ok(())
}
