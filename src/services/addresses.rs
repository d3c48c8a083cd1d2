use std::sync::Arc;

use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    entities::user_address::{self, Entity as UserAddressEntity},
    errors::ServiceError,
};

/// Address lookups scoped to their owning user.
#[derive(Clone)]
pub struct AddressService {
    db: Arc<DatabaseConnection>,
}

impl AddressService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Resolves an address for the given user. An address that exists but
    /// belongs to someone else is indistinguishable from a missing one.
    #[instrument(skip(self))]
    pub async fn get_address(
        &self,
        user_id: Uuid,
        address_id: Uuid,
    ) -> Result<user_address::Model, ServiceError> {
        UserAddressEntity::find_by_id(address_id)
            .filter(user_address::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Address {} not found for user {}",
                    address_id, user_id
                ))
            })
    }

    /// All addresses for a user.
    #[instrument(skip(self))]
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<user_address::Model>, ServiceError> {
        let addresses = UserAddressEntity::find()
            .filter(user_address::Column::UserId.eq(user_id))
            .all(&*self.db)
            .await?;
        Ok(addresses)
    }
}
