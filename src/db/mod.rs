mod memory;
mod postgres;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::info;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use crate::models::employee::{Employee, EmployeeFilter};

pub use memory::MemoryEmployeeStore;
pub use postgres::PgEmployeeStore;

/// `DATABASE_URL` values with this prefix select the in-process store.
pub const MEMORY_URL_PREFIX: &str = "memory:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Another record already holds the NIC number.
    UniqueViolation,
    /// A stored row could not be turned back into an employee.
    Corrupt(String),
    Backend(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::UniqueViolation => write!(f, "unique constraint violated"),
            StoreError::Corrupt(msg) => write!(f, "corrupt record: {}", msg),
            StoreError::Backend(msg) => write!(f, "store backend error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        let unique = err
            .as_database_error()
            .and_then(|db| db.code())
            .map_or(false, |code| code == "23505");
        if unique {
            StoreError::UniqueViolation
        } else {
            StoreError::Backend(err.to_string())
        }
    }
}

/// Persistence port for employee records.
///
/// Implementations must enforce NIC uniqueness themselves: the service checks
/// before writing, but two concurrent writers can both pass that check.
#[async_trait]
pub trait EmployeeStore: Send + Sync {
    /// Records in the store's natural (insertion) order.
    async fn list(&self, filter: &EmployeeFilter) -> Result<Vec<Employee>, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Employee>, StoreError>;
    async fn find_by_nic(&self, nic_number: &str) -> Result<Option<Employee>, StoreError>;
    async fn insert(&self, employee: &Employee) -> Result<Employee, StoreError>;
    /// Replaces the stored record with the same id. `None` if it no longer exists.
    async fn update(&self, employee: &Employee) -> Result<Option<Employee>, StoreError>;
    /// `false` if nothing was deleted.
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}

/// Opens the store named by `database_url`, applying migrations for Postgres.
pub async fn connect(database_url: &str) -> Result<Arc<dyn EmployeeStore>, StoreError> {
    if database_url.starts_with(MEMORY_URL_PREFIX) {
        info!("Using in-memory employee store; records are lost on restart");
        return Ok(Arc::new(MemoryEmployeeStore::default()));
    }

    let pool = PgPoolOptions::new()
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await?;
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|err| StoreError::Backend(err.to_string()))?;
    info!("Connected to Postgres and applied migrations");

    Ok(Arc::new(PgEmployeeStore::new(pool)))
}
