//! Persistence capability for resource records.
//!
//! [`RecordStore`] is the only thing the request pipeline knows about
//! storage: filter, order, paginate, find, create, update and delete over a
//! named table. [`MemoryStore`] backs tests and demos; [`PgRecordStore`]
//! talks to PostgreSQL through sqlx.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

use sqlx::postgres::PgPoolOptions;

pub use error::StoreError;
pub use memory::{MemoryStore, TableSchema};
pub use postgres::PgRecordStore;
pub use store::RecordStore;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Run a trivial query to verify the pool can reach the database.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await
        .map(|_| ())
}
