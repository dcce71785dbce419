use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::broadcast;
use uuid::Uuid;

use super::{
    AuthProviderError, ChangeOp, ExternalSession, RowStore, SessionProvider, StoreError, Table,
    TableChange,
};

/// In-process row store used by the demo binary and the tests. Behaves like
/// the hosted backend: table-level CRUD over JSON rows keyed by `id`, and a
/// broadcast change stream per table.
pub struct MemoryStore {
    tables: DashMap<Table, HashMap<Uuid, Value>>,
    channels: DashMap<Table, broadcast::Sender<TableChange>>,
    event_buffer: usize,
}

impl MemoryStore {
    pub fn new(event_buffer: usize) -> Self {
        Self {
            tables: DashMap::new(),
            channels: DashMap::new(),
            event_buffer,
        }
    }

    fn sender(&self, table: Table) -> broadcast::Sender<TableChange> {
        self.channels
            .entry(table)
            .or_insert_with(|| broadcast::channel(self.event_buffer).0)
            .clone()
    }

    fn emit(&self, table: Table, op: ChangeOp, row_id: Uuid) {
        // nobody listening is fine
        let _ = self.sender(table).send(TableChange { table, op, row_id });
    }

    fn row_id(row: &Value) -> Result<Uuid, StoreError> {
        row.get("id")
            .and_then(Value::as_str)
            .and_then(|raw| raw.parse().ok())
            .ok_or_else(|| StoreError::Malformed("row has no usable id".to_string()))
    }
}

#[async_trait]
impl RowStore for MemoryStore {
    async fn select(&self, table: Table) -> Result<Vec<Value>, StoreError> {
        Ok(self
            .tables
            .get(&table)
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn insert(&self, table: Table, mut row: Value) -> Result<Value, StoreError> {
        if row.get("id").is_none() {
            let object = row
                .as_object_mut()
                .ok_or_else(|| StoreError::Malformed("row is not an object".to_string()))?;
            object.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
        }
        let id = Self::row_id(&row)?;

        self.tables.entry(table).or_default().insert(id, row.clone());
        self.emit(table, ChangeOp::Insert, id);
        Ok(row)
    }

    async fn update(&self, table: Table, id: Uuid, patch: Value) -> Result<Value, StoreError> {
        let patch = patch
            .as_object()
            .ok_or_else(|| StoreError::Malformed("patch is not an object".to_string()))?
            .clone();

        let mut rows = self.tables.entry(table).or_default();
        let row = rows.get_mut(&id).ok_or(StoreError::Missing(id))?;
        let object = row
            .as_object_mut()
            .ok_or_else(|| StoreError::Malformed("stored row is not an object".to_string()))?;
        for (key, value) in patch {
            if key == "id" {
                continue;
            }
            object.insert(key, value);
        }
        let updated = row.clone();
        drop(rows);

        self.emit(table, ChangeOp::Update, id);
        Ok(updated)
    }

    async fn delete(&self, table: Table, id: Uuid) -> Result<(), StoreError> {
        let removed = self
            .tables
            .entry(table)
            .or_default()
            .remove(&id)
            .is_some();
        if !removed {
            return Err(StoreError::Missing(id));
        }
        self.emit(table, ChangeOp::Delete, id);
        Ok(())
    }

    fn subscribe(&self, table: Table) -> broadcast::Receiver<TableChange> {
        self.sender(table).subscribe()
    }
}

/// Demo session provider: a fixed set of email/password accounts and one
/// current session, standing in for the hosted auth service.
pub struct DemoSessions {
    accounts: DashMap<String, String>,
    current: Mutex<Option<ExternalSession>>,
}

impl DemoSessions {
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
            current: Mutex::new(None),
        }
    }

    pub fn register(&self, email: &str, password: &str) {
        self.accounts.insert(email.to_string(), password.to_string());
    }

    fn current(&self) -> std::sync::MutexGuard<'_, Option<ExternalSession>> {
        self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for DemoSessions {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionProvider for DemoSessions {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ExternalSession, AuthProviderError> {
        match self.accounts.get(email) {
            Some(stored) if stored.value() == password => {
                let session = ExternalSession {
                    email: email.to_string(),
                    access_token: Uuid::new_v4().to_string(),
                };
                *self.current() = Some(session.clone());
                Ok(session)
            }
            _ => Err(AuthProviderError::InvalidCredentials),
        }
    }

    async fn sign_out(&self) -> Result<(), AuthProviderError> {
        *self.current() = None;
        Ok(())
    }

    async fn get_session(&self) -> Result<Option<ExternalSession>, AuthProviderError> {
        Ok(self.current().clone())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn insert_assigns_an_id_when_missing() {
        let store = MemoryStore::new(16);
        let row = store
            .insert(Table::Deliveries, json!({ "driver": "Karim" }))
            .await
            .unwrap();
        assert!(row["id"].as_str().unwrap().parse::<Uuid>().is_ok());
    }

    #[tokio::test]
    async fn update_merges_patch_and_keeps_id() {
        let store = MemoryStore::new(16);
        let row = store
            .insert(Table::Users, json!({ "name": "Amina", "role": "admin" }))
            .await
            .unwrap();
        let id: Uuid = row["id"].as_str().unwrap().parse().unwrap();

        let updated = store
            .update(Table::Users, id, json!({ "name": "Amina B.", "id": "ignored" }))
            .await
            .unwrap();
        assert_eq!(updated["name"], "Amina B.");
        assert_eq!(updated["role"], "admin");
        assert_eq!(updated["id"], row["id"]);
    }

    #[tokio::test]
    async fn delete_missing_row_errors() {
        let store = MemoryStore::new(16);
        let result = store.delete(Table::Users, Uuid::from_u128(5)).await;
        assert!(matches!(result, Err(StoreError::Missing(_))));
    }

    #[tokio::test]
    async fn mutations_notify_subscribers() {
        let store = MemoryStore::new(16);
        let mut rx = store.subscribe(Table::Deliveries);

        store
            .insert(Table::Deliveries, json!({ "driver": "Karim" }))
            .await
            .unwrap();

        let change = rx.recv().await.unwrap();
        assert_eq!(change.table, Table::Deliveries);
        assert_eq!(change.op, ChangeOp::Insert);
    }

    #[tokio::test]
    async fn demo_sessions_reject_wrong_password() {
        let sessions = DemoSessions::new();
        sessions.register("admin@fleetboard.ma", "demo123");

        let err = sessions
            .sign_in_with_password("admin@fleetboard.ma", "wrong")
            .await;
        assert!(err.is_err());
        assert!(sessions.get_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn demo_sessions_track_the_current_session() {
        let sessions = DemoSessions::new();
        sessions.register("admin@fleetboard.ma", "demo123");

        sessions
            .sign_in_with_password("admin@fleetboard.ma", "demo123")
            .await
            .unwrap();
        let current = sessions.get_session().await.unwrap().unwrap();
        assert_eq!(current.email, "admin@fleetboard.ma");

        sessions.sign_out().await.unwrap();
        assert!(sessions.get_session().await.unwrap().is_none());
    }
}
