use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::auth::notify::NoticeLevel;
use crate::auth::session::AuthService;
use crate::error::AppError;
use crate::models::user::{Role, User};
use crate::store::Table;

#[derive(Debug, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub phone: Option<String>,
}

/// User administration. Every mutation is gated on the action table first;
/// a denial notifies and never reaches the row-store.
impl AuthService {
    pub async fn add_user(&mut self, new_user: NewUser) -> Result<User, AppError> {
        self.ensure_action("users.create")?;

        if new_user.name.trim().is_empty() {
            return Err(AppError::BadRequest("name cannot be empty".to_string()));
        }
        if !new_user.email.contains('@') {
            return Err(AppError::BadRequest(format!(
                "{} is not an email address",
                new_user.email
            )));
        }

        let user = User {
            id: Uuid::new_v4(),
            name: new_user.name,
            email: new_user.email,
            role: new_user.role,
            phone: new_user.phone,
        };
        let row = serde_json::to_value(&user)
            .map_err(|err| AppError::Internal(format!("failed to encode user: {err}")))?;
        self.store().insert(Table::Users, row).await?;

        self.refresh_users().await;
        Ok(user)
    }

    pub async fn update_user(&mut self, id: Uuid, patch: Value) -> Result<User, AppError> {
        self.ensure_action("users.update")?;

        let row = self.store().update(Table::Users, id, patch).await?;
        self.refresh_users().await;

        serde_json::from_value(row)
            .map_err(|err| AppError::Internal(format!("stored user is malformed: {err}")))
    }

    pub async fn delete_user(&mut self, id: Uuid) -> Result<(), AppError> {
        self.ensure_action("users.delete")?;

        self.store().delete(Table::Users, id).await?;
        self.refresh_users().await;
        Ok(())
    }

    fn ensure_action(&self, action: &str) -> Result<(), AppError> {
        if self.has_action_permission(action) {
            return Ok(());
        }
        self.notifier().notify(
            NoticeLevel::Warning,
            &format!("permission denied: {action}"),
        );
        Err(AppError::Forbidden(format!(
            "{action} requires a permitted role"
        )))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::auth::notify::RecordingNotifier;
    use crate::auth::session::{AuthService, BUILTIN_ACCOUNTS};
    use crate::store::memory::{DemoSessions, MemoryStore};
    use crate::store::RowStore;

    async fn logged_in(shorthand: &str, notifier: Arc<RecordingNotifier>) -> (AuthService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new(16));
        let sessions = Arc::new(DemoSessions::new());
        for account in BUILTIN_ACCOUNTS {
            sessions.register(account.email, "demo123");
        }
        let mut service = AuthService::init(sessions, store.clone(), notifier).await;
        assert!(service.login(shorthand, "demo123").await);
        (service, store)
    }

    fn new_user() -> NewUser {
        NewUser {
            name: "Salma Idrissi".to_string(),
            email: "salma@fleetboard.ma".to_string(),
            role: Role::Dispatcher,
            phone: None,
        }
    }

    #[tokio::test]
    async fn admin_can_add_a_user_and_the_cache_refreshes() {
        let (mut service, store) = logged_in("admin", Arc::new(RecordingNotifier::new())).await;

        let user = service.add_user(new_user()).await.unwrap();
        assert_eq!(user.role, Role::Dispatcher);

        assert!(service
            .users()
            .iter()
            .any(|cached| cached.email == "salma@fleetboard.ma"));
        assert_eq!(store.select(Table::Users).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn driver_is_denied_user_creation_with_a_notice() {
        let notifier = Arc::new(RecordingNotifier::new());
        let (mut service, store) = logged_in("driver", notifier.clone()).await;

        let result = service.add_user(new_user()).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));

        // the denial was visible and nothing reached the store
        assert!(notifier
            .notices()
            .iter()
            .any(|notice| notice.message.contains("users.create")));
        assert!(store.select(Table::Users).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_patches_the_row_and_returns_the_user() {
        let (mut service, _store) = logged_in("admin", Arc::new(RecordingNotifier::new())).await;
        let user = service.add_user(new_user()).await.unwrap();

        let updated = service
            .update_user(user.id, serde_json::json!({ "phone": "+212-600-000099" }))
            .await
            .unwrap();
        assert_eq!(updated.phone.as_deref(), Some("+212-600-000099"));
        assert_eq!(updated.name, "Salma Idrissi");
    }

    #[tokio::test]
    async fn delete_removes_the_row() {
        let (mut service, store) = logged_in("admin", Arc::new(RecordingNotifier::new())).await;
        let user = service.add_user(new_user()).await.unwrap();

        service.delete_user(user.id).await.unwrap();
        assert!(store.select(Table::Users).await.unwrap().is_empty());
        assert!(service.users().is_empty());
    }
}
