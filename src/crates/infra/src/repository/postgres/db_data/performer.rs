use domain::performer::Performer;
use domain::value::PerformerId;
use sea_orm::entity::prelude::*;
use sea_orm::Set;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Default)]
#[sea_orm(table_name = "performers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    #[sea_orm(column_type = "BigInteger")]
    pub id: i64,
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    MediaItem,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Self::MediaItem => Entity::has_many(super::media_item::Entity).into(),
        }
    }
}

impl Related<super::media_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MediaItem.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Performer {
    fn from(model: Model) -> Self {
        Performer {
            id: PerformerId::from(model.id),
            name: model.name,
        }
    }
}

impl From<&Performer> for ActiveModel {
    fn from(performer: &Performer) -> Self {
        Self {
            id: Set(performer.id.as_i64()),
            name: Set(performer.name.clone()),
        }
    }
}
