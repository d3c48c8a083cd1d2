use std::sync::Arc;

use chrono::Utc;
use rand::Rng;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};
use tracing::{debug, instrument, warn};

use crate::{
    entities::order::{self, Entity as OrderEntity},
    errors::ServiceError,
};

const MIN_ORDER_NUMBER: u32 = 1_000_000;
const MAX_ORDER_NUMBER: u32 = 9_999_999;
const MAX_ATTEMPTS: u32 = 100;

/// Generates unique 7-digit order numbers in [1000000, 9999999].
#[derive(Clone)]
pub struct OrderNumberGenerator {
    db: Arc<DatabaseConnection>,
}

impl OrderNumberGenerator {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Draws random candidates until one is unused, giving up after
    /// `MAX_ATTEMPTS` and falling back to a timestamp-derived value.
    #[instrument(skip(self))]
    pub async fn generate(&self) -> Result<String, ServiceError> {
        for attempt in 1..=MAX_ATTEMPTS {
            let candidate = random_order_number();
            if !self.exists(&candidate).await? {
                debug!(order_number = %candidate, "generated unique order number");
                return Ok(candidate);
            }
            debug!(
                order_number = %candidate,
                attempt,
                max_attempts = MAX_ATTEMPTS,
                "order number already exists"
            );
        }

        let fallback = fallback_order_number(Utc::now().timestamp_millis());
        warn!(
            attempts = MAX_ATTEMPTS,
            order_number = %fallback,
            "could not draw a unique order number, using timestamp fallback"
        );
        Ok(fallback)
    }

    async fn exists(&self, candidate: &str) -> Result<bool, ServiceError> {
        let count = OrderEntity::find()
            .filter(order::Column::OrderNumber.eq(candidate))
            .count(&*self.db)
            .await?;
        Ok(count > 0)
    }
}

/// Same retry-then-fallback loop with an injected existence oracle. The
/// async `generate` above is this loop with the database as the oracle.
pub fn generate_with<F>(mut exists: F) -> String
where
    F: FnMut(&str) -> bool,
{
    for _ in 0..MAX_ATTEMPTS {
        let candidate = random_order_number();
        if !exists(&candidate) {
            return candidate;
        }
    }
    fallback_order_number(Utc::now().timestamp_millis())
}

fn random_order_number() -> String {
    rand::thread_rng()
        .gen_range(MIN_ORDER_NUMBER..=MAX_ORDER_NUMBER)
        .to_string()
}

/// Maps a millisecond timestamp into the 7-digit range. Unlike a plain
/// modulo of 10^7 this cannot spill into 8 digits.
fn fallback_order_number(timestamp_millis: i64) -> String {
    let offset = (timestamp_millis.unsigned_abs() % 9_000_000) as u32;
    (MIN_ORDER_NUMBER + offset).to_string()
}

/// True for strings of exactly 7 digits within the generator's range.
pub fn is_valid_order_number(value: &str) -> bool {
    if value.len() != 7 {
        return false;
    }
    match value.parse::<u32>() {
        Ok(n) => (MIN_ORDER_NUMBER..=MAX_ORDER_NUMBER).contains(&n),
        Err(_) => false,
    }
}
