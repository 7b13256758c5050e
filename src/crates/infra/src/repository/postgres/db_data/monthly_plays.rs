use domain::value::{PerformerId, PlayPeriod};
use sea_orm::entity::prelude::*;
use sea_orm::{Condition, Set};

/// Per-performer play totals, one row per calendar month.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Default)]
#[sea_orm(table_name = "monthly_plays")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    #[sea_orm(column_type = "BigInteger")]
    pub owner_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub month: i32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub year: i32,
    #[sea_orm(column_type = "BigInteger")]
    pub total_plays: i64,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Owner,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Self::Owner => Entity::belongs_to(super::performer::Entity)
                .from(Column::OwnerId)
                .to(super::performer::Column::Id)
                .into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    /// The row created on the first play of a period, before it is incremented.
    pub fn empty(owner_id: PerformerId, period: PlayPeriod) -> Self {
        Self {
            owner_id: Set(owner_id.as_i64()),
            month: Set(period.month() as i32),
            year: Set(period.year() as i32),
            total_plays: Set(0),
        }
    }
}

/// Equality condition on the composite key.
pub fn key_condition(owner_id: PerformerId, period: PlayPeriod) -> Condition {
    Condition::all()
        .add(Column::OwnerId.eq(owner_id.as_i64()))
        .add(Column::Month.eq(period.month() as i32))
        .add(Column::Year.eq(period.year() as i32))
}
