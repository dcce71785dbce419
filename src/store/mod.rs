pub mod memory;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::broadcast;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Vehicles,
    Drivers,
    Orders,
    Deliveries,
    MaintenanceTasks,
    Inventory,
    Users,
    Routes,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Vehicles => "vehicles",
            Table::Drivers => "drivers",
            Table::Orders => "orders",
            Table::Deliveries => "deliveries",
            Table::MaintenanceTasks => "maintenance_tasks",
            Table::Inventory => "inventory",
            Table::Users => "users",
            Table::Routes => "routes",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeOp {
    Insert,
    Update,
    Delete,
}

/// "Something changed, re-fetch" notification delivered to subscribers of a
/// table. Carries no row data on purpose: the store is the source of truth.
#[derive(Debug, Clone, Serialize)]
pub struct TableChange {
    pub table: Table,
    pub op: ChangeOp,
    pub row_id: Uuid,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("row {0} not found")]
    Missing(Uuid),

    #[error("malformed row: {0}")]
    Malformed(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// The hosted row-store this back office runs against. Table-level CRUD plus
/// a per-table change subscription; rows travel as JSON objects with an `id`.
#[async_trait]
pub trait RowStore: Send + Sync {
    async fn select(&self, table: Table) -> Result<Vec<Value>, StoreError>;
    async fn insert(&self, table: Table, row: Value) -> Result<Value, StoreError>;
    async fn update(&self, table: Table, id: Uuid, patch: Value) -> Result<Value, StoreError>;
    async fn delete(&self, table: Table, id: Uuid) -> Result<(), StoreError>;
    fn subscribe(&self, table: Table) -> broadcast::Receiver<TableChange>;
}

#[derive(Debug, Clone)]
pub struct ExternalSession {
    pub email: String,
    pub access_token: String,
}

#[derive(Debug, Error)]
pub enum AuthProviderError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("auth provider unavailable: {0}")]
    Unavailable(String),
}

/// The external session/auth collaborator.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ExternalSession, AuthProviderError>;
    async fn sign_out(&self) -> Result<(), AuthProviderError>;
    async fn get_session(&self) -> Result<Option<ExternalSession>, AuthProviderError>;
}
