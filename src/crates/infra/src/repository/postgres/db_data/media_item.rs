use domain::media_item::MediaItem;
use domain::value::{MediaItemId, PerformerId};
use sea_orm::entity::prelude::*;
use sea_orm::Set;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Default)]
#[sea_orm(table_name = "media_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    #[sea_orm(column_type = "BigInteger")]
    pub id: i64,
    pub title: String,
    #[sea_orm(column_type = "BigInteger")]
    pub owner_id: i64,
    #[sea_orm(column_type = "BigInteger")]
    pub play_count: i64,
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

impl Related<super::performer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for MediaItem {
    fn from(model: Model) -> Self {
        MediaItem {
            id: MediaItemId::from(model.id),
            title: model.title,
            owner_id: PerformerId::from(model.owner_id),
            play_count: model.play_count,
        }
    }
}

impl From<&MediaItem> for ActiveModel {
    fn from(item: &MediaItem) -> Self {
        Self {
            id: Set(item.id.as_i64()),
            title: Set(item.title.clone()),
            owner_id: Set(item.owner_id.as_i64()),
            play_count: Set(item.play_count),
        }
    }
}
