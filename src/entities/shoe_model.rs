use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sellable variant of a shoe (color/material combination). The price here
/// is the current list price; orders snapshot it into their line items.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "shoe_models")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub shoe_id: Uuid,
    pub model_name: String,
    pub color: String,
    #[sea_orm(unique)]
    pub sku: String,
    pub price: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::shoe::Entity",
        from = "Column::ShoeId",
        to = "super::shoe::Column::Id"
    )]
    Shoe,
    #[sea_orm(has_many = "super::shoe_inventory::Entity")]
    ShoeInventory,
}

impl Related<super::shoe::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Shoe.def()
    }
}

impl Related<super::shoe_inventory::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ShoeInventory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
