use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per (shoe model, size) stock counters.
///
/// `quantity_reserved` is an earmarked sub-count of `quantity_available`:
/// reserving does not change the available counter, and the sellable stock
/// at any moment is `actual_available()`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "shoe_inventory")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub shoe_model_id: Uuid,
    pub size: String,
    pub quantity_available: i32,
    pub quantity_reserved: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Model {
    /// Stock that can still be promised to a new order. Never negative.
    pub fn actual_available(&self) -> i32 {
        (self.quantity_available - self.quantity_reserved).max(0)
    }

    /// True when at least one unit is not yet earmarked.
    pub fn is_sellable(&self) -> bool {
        self.quantity_available > 0 && self.quantity_available > self.quantity_reserved
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::shoe_model::Entity",
        from = "Column::ShoeModelId",
        to = "super::shoe_model::Column::Id"
    )]
    ShoeModel,
}

impl Related<super::shoe_model::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ShoeModel.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
