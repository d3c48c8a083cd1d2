use std::time::Duration;

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, Statement};
use tracing::info;

use crate::config::AppConfig;

/// Establishes the database connection pool described by the configuration.
pub async fn connect(config: &AppConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.database_url.clone());
    options
        .max_connections(config.db_max_connections)
        .min_connections(config.db_min_connections)
        .connect_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(300))
        .sqlx_logging(false);

    let db = Database::connect(options).await?;
    db.ping().await?;

    info!(
        max_connections = config.db_max_connections,
        "database connection established"
    );

    Ok(db)
}

/// DDL for the dev/test profile. Types use SQLite affinities; UUIDs and
/// timestamps are stored as text, money as numeric.
const SCHEMA_STATEMENTS: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS shoes (
        id TEXT PRIMARY KEY NOT NULL,
        name TEXT NOT NULL,
        description TEXT,
        is_active INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL,
        updated_at TEXT
    );"#,
    r#"CREATE TABLE IF NOT EXISTS shoe_models (
        id TEXT PRIMARY KEY NOT NULL,
        shoe_id TEXT NOT NULL,
        model_name TEXT NOT NULL,
        color TEXT NOT NULL,
        sku TEXT NOT NULL UNIQUE,
        price NUMERIC NOT NULL,
        is_active INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL,
        updated_at TEXT
    );"#,
    r#"CREATE TABLE IF NOT EXISTS shoe_inventory (
        id TEXT PRIMARY KEY NOT NULL,
        shoe_model_id TEXT NOT NULL,
        size TEXT NOT NULL,
        quantity_available INTEGER NOT NULL DEFAULT 0,
        quantity_reserved INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT,
        UNIQUE (shoe_model_id, size)
    );"#,
    r#"CREATE TABLE IF NOT EXISTS user_addresses (
        id TEXT PRIMARY KEY NOT NULL,
        user_id TEXT NOT NULL,
        label TEXT NOT NULL,
        street TEXT NOT NULL,
        city TEXT NOT NULL,
        postal_code TEXT NOT NULL,
        country TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT
    );"#,
    r#"CREATE TABLE IF NOT EXISTS orders (
        id TEXT PRIMARY KEY NOT NULL,
        order_number TEXT NOT NULL UNIQUE,
        user_id TEXT NOT NULL,
        status TEXT NOT NULL,
        total_amount NUMERIC NOT NULL DEFAULT 0,
        shipping_address_id TEXT NOT NULL,
        order_date TEXT NOT NULL,
        shipped_date TEXT,
        delivered_date TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT,
        version INTEGER NOT NULL DEFAULT 1
    );"#,
    r#"CREATE TABLE IF NOT EXISTS order_items (
        id TEXT PRIMARY KEY NOT NULL,
        order_id TEXT NOT NULL,
        shoe_model_id TEXT NOT NULL,
        size TEXT NOT NULL,
        quantity INTEGER NOT NULL,
        unit_price NUMERIC NOT NULL,
        total_price NUMERIC NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT
    );"#,
    "CREATE INDEX IF NOT EXISTS idx_orders_user_id ON orders (user_id);",
    "CREATE INDEX IF NOT EXISTS idx_order_items_order_id ON order_items (order_id);",
    "CREATE INDEX IF NOT EXISTS idx_shoe_inventory_model ON shoe_inventory (shoe_model_id);",
];

/// Creates any missing tables. Idempotent.
pub async fn bootstrap_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    for sql in SCHEMA_STATEMENTS {
        db.execute(Statement::from_string(
            db.get_database_backend(),
            (*sql).to_string(),
        ))
        .await?;
    }
    info!("schema bootstrap complete");
    Ok(())
}
