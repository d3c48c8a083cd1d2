use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Parent product. A shoe that is inactive makes every one of its models
/// unsellable regardless of the model's own flag.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "shoes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::shoe_model::Entity")]
    ShoeModel,
}

impl Related<super::shoe_model::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ShoeModel.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
