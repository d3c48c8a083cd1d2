use std::collections::HashMap;
use std::sync::Arc;

use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    entities::{
        shoe,
        shoe_model::{self, Entity as ShoeModelEntity},
    },
    errors::ServiceError,
};

/// A shoe model joined with its parent's active flag. Instances of this are
/// loaded once per request and passed explicitly to whatever needs them.
#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub model: shoe_model::Model,
    pub shoe_is_active: bool,
}

impl LoadedModel {
    /// Sellable only when both the model and its parent shoe are active.
    pub fn is_sellable(&self) -> bool {
        self.model.is_active && self.shoe_is_active
    }
}

/// Read-side catalog lookups used by checkout.
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DatabaseConnection>,
}

impl CatalogService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Batch-loads the given model ids with their parent shoes. Ids without
    /// a matching model are simply absent from the map.
    #[instrument(skip(self, ids), fields(requested = ids.len()))]
    pub async fn load_models(
        &self,
        ids: &[Uuid],
    ) -> Result<HashMap<Uuid, LoadedModel>, ServiceError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = ShoeModelEntity::find()
            .filter(shoe_model::Column::Id.is_in(ids.to_vec()))
            .find_also_related(shoe::Entity)
            .all(&*self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(model, parent)| {
                let shoe_is_active = parent.map(|s| s.is_active).unwrap_or(false);
                (
                    model.id,
                    LoadedModel {
                        model,
                        shoe_is_active,
                    },
                )
            })
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn get_model(&self, id: Uuid) -> Result<shoe_model::Model, ServiceError> {
        ShoeModelEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Shoe model {} not found", id)))
    }
}
