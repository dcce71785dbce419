use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::notify::{NoticeLevel, Notifier};
use crate::auth::roles;
use crate::models::user::{Role, User};
use crate::store::{RowStore, SessionProvider, Table};

/// Demo accounts that keep the console usable when the users table is
/// unreachable, and that map login shorthands to emails.
pub struct BuiltinAccount {
    pub shorthand: &'static str,
    pub email: &'static str,
    pub name: &'static str,
    pub role: Role,
}

pub const BUILTIN_ACCOUNTS: &[BuiltinAccount] = &[
    BuiltinAccount {
        shorthand: "admin",
        email: "admin@fleetboard.ma",
        name: "Amina Benali",
        role: Role::Admin,
    },
    BuiltinAccount {
        shorthand: "manager",
        email: "manager@fleetboard.ma",
        name: "Youssef El Fassi",
        role: Role::Manager,
    },
    BuiltinAccount {
        shorthand: "dispatcher",
        email: "dispatcher@fleetboard.ma",
        name: "Karim Tazi",
        role: Role::Dispatcher,
    },
    BuiltinAccount {
        shorthand: "driver",
        email: "driver@fleetboard.ma",
        name: "Hassan Alaoui",
        role: Role::Driver,
    },
];

pub fn builtin_user(email: &str) -> Option<User> {
    BUILTIN_ACCOUNTS
        .iter()
        .enumerate()
        .find(|(_, account)| account.email.eq_ignore_ascii_case(email))
        .map(|(index, account)| User {
            id: Uuid::from_u128(index as u128 + 1),
            name: account.name.to_string(),
            email: account.email.to_string(),
            role: account.role,
            phone: None,
        })
}

/// The operator session. `is_authenticated` holds iff a user is present.
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub user: Option<User>,
    pub is_loading: bool,
}

impl AuthSession {
    pub fn anonymous() -> Self {
        Self {
            user: None,
            is_loading: false,
        }
    }

    fn loading() -> Self {
        Self {
            user: None,
            is_loading: true,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

/// Process-wide auth state: the current session, the cached user list, and
/// every role/permission decision. All mutations of the users table funnel
/// through here so gating cannot be bypassed.
pub struct AuthService {
    session: AuthSession,
    users: Vec<User>,
    provider: Arc<dyn SessionProvider>,
    store: Arc<dyn RowStore>,
    notifier: Arc<dyn Notifier>,
}

impl AuthService {
    /// Checks the external session once at startup; lands the session in
    /// `Authenticated` or `Anonymous` and leaves the loading flag cleared.
    pub async fn init(
        provider: Arc<dyn SessionProvider>,
        store: Arc<dyn RowStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let mut service = Self {
            session: AuthSession::loading(),
            users: Vec::new(),
            provider,
            store,
            notifier,
        };

        match service.provider.get_session().await {
            Ok(Some(external)) => {
                service.session.user = service.profile_for(&external.email).await;
            }
            Ok(None) => {}
            Err(err) => {
                warn!(error = %err, "external session check failed, starting anonymous");
            }
        }
        service.session.is_loading = false;

        if service.session.is_authenticated() {
            service.refresh_users().await;
        }
        service
    }

    pub fn session(&self) -> &AuthSession {
        &self.session
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn role(&self) -> Option<Role> {
        self.session.user.as_ref().map(|user| user.role)
    }

    pub fn has_permission(&self, required: &[Role]) -> bool {
        roles::permitted(self.role(), required)
    }

    pub fn has_action_permission(&self, action: &str) -> bool {
        roles::action_allows(self.role(), action)
    }

    pub fn can_access_route(&self, path: &str) -> bool {
        roles::route_allows(self.role(), path)
    }

    /// Fails closed: any error leaves the session anonymous, returns `false`,
    /// and surfaces a notice. `identifier` may be an email or a shorthand.
    pub async fn login(&mut self, identifier: &str, secret: &str) -> bool {
        let email = self.resolve_identifier(identifier);
        match self.provider.sign_in_with_password(&email, secret).await {
            Ok(external) => match self.profile_for(&external.email).await {
                Some(user) => {
                    info!(email = %user.email, role = user.role.as_str(), "login succeeded");
                    self.session = AuthSession {
                        user: Some(user),
                        is_loading: false,
                    };
                    self.refresh_users().await;
                    true
                }
                None => {
                    self.notifier.notify(
                        NoticeLevel::Error,
                        &format!("login failed: no profile for {email}"),
                    );
                    false
                }
            },
            Err(err) => {
                self.notifier
                    .notify(NoticeLevel::Error, &format!("login failed: {err}"));
                false
            }
        }
    }

    /// Safe to call while already anonymous.
    pub async fn logout(&mut self) {
        if let Err(err) = self.provider.sign_out().await {
            warn!(error = %err, "external sign-out failed");
        }
        self.session = AuthSession::anonymous();
    }

    fn resolve_identifier(&self, identifier: &str) -> String {
        if identifier.contains('@') {
            return identifier.to_string();
        }
        BUILTIN_ACCOUNTS
            .iter()
            .find(|account| account.shorthand.eq_ignore_ascii_case(identifier))
            .map(|account| account.email.to_string())
            .or_else(|| {
                self.users
                    .iter()
                    .find(|user| user.name.eq_ignore_ascii_case(identifier))
                    .map(|user| user.email.clone())
            })
            .unwrap_or_else(|| identifier.to_string())
    }

    /// Profile from the users table, falling back to the built-in accounts
    /// when the table is unreachable or has no matching row.
    async fn profile_for(&self, email: &str) -> Option<User> {
        match self.store.select(Table::Users).await {
            Ok(rows) => {
                for row in rows {
                    if let Ok(user) = serde_json::from_value::<User>(row) {
                        if user.email.eq_ignore_ascii_case(email) {
                            return Some(user);
                        }
                    }
                }
            }
            Err(err) => {
                warn!(error = %err, "user lookup failed, falling back to built-in accounts");
            }
        }
        builtin_user(email)
    }

    pub async fn refresh_users(&mut self) {
        match self.store.select(Table::Users).await {
            Ok(rows) => {
                self.users = rows
                    .into_iter()
                    .filter_map(|row| serde_json::from_value(row).ok())
                    .collect();
            }
            Err(err) => {
                warn!(error = %err, "failed to refresh the cached user list");
            }
        }
    }

    pub(crate) fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    pub(crate) fn store(&self) -> &Arc<dyn RowStore> {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::auth::notify::{NoticeLevel, RecordingNotifier};
    use crate::store::memory::{DemoSessions, MemoryStore};

    async fn service_with(
        notifier: Arc<RecordingNotifier>,
    ) -> (AuthService, Arc<MemoryStore>, Arc<DemoSessions>) {
        let store = Arc::new(MemoryStore::new(16));
        let sessions = Arc::new(DemoSessions::new());
        for account in BUILTIN_ACCOUNTS {
            sessions.register(account.email, "demo123");
        }
        let service =
            AuthService::init(sessions.clone(), store.clone(), notifier).await;
        (service, store, sessions)
    }

    #[tokio::test]
    async fn starts_anonymous_when_no_external_session() {
        let (service, _store, _sessions) = service_with(Arc::new(RecordingNotifier::new())).await;
        assert!(!service.session().is_authenticated());
        assert!(!service.session().is_loading);
    }

    #[tokio::test]
    async fn login_with_shorthand_resolves_to_builtin_account() {
        let notifier = Arc::new(RecordingNotifier::new());
        let (mut service, _store, _sessions) = service_with(notifier).await;

        assert!(service.login("admin", "demo123").await);
        let user = service.session().user.as_ref().unwrap();
        assert_eq!(user.email, "admin@fleetboard.ma");
        assert_eq!(user.role, Role::Admin);
    }

    #[tokio::test]
    async fn login_fails_closed_on_wrong_password() {
        let notifier = Arc::new(RecordingNotifier::new());
        let (mut service, _store, _sessions) = service_with(notifier.clone()).await;

        assert!(!service.login("admin", "wrong-password").await);
        assert!(!service.session().is_authenticated());

        let notices = notifier.notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Error);
        assert!(notices[0].message.contains("login failed"));
    }

    #[tokio::test]
    async fn profile_prefers_the_users_table_over_builtins() {
        let notifier = Arc::new(RecordingNotifier::new());
        let (mut service, store, _sessions) = service_with(notifier).await;

        store
            .insert(
                Table::Users,
                serde_json::json!({
                    "id": Uuid::from_u128(77).to_string(),
                    "name": "Amina Benali",
                    "email": "admin@fleetboard.ma",
                    "role": "admin",
                    "phone": "+212-600-000001"
                }),
            )
            .await
            .unwrap();

        assert!(service.login("admin", "demo123").await);
        let user = service.session().user.as_ref().unwrap();
        assert_eq!(user.id, Uuid::from_u128(77));
        assert_eq!(user.phone.as_deref(), Some("+212-600-000001"));
    }

    #[tokio::test]
    async fn logout_is_safe_when_already_anonymous() {
        let (mut service, _store, _sessions) = service_with(Arc::new(RecordingNotifier::new())).await;
        service.logout().await;
        service.logout().await;
        assert!(!service.session().is_authenticated());
    }

    #[tokio::test]
    async fn permission_checks_follow_the_session() {
        let notifier = Arc::new(RecordingNotifier::new());
        let (mut service, _store, _sessions) = service_with(notifier).await;

        assert!(service.has_permission(&[]));
        assert!(!service.has_permission(&[Role::Admin]));

        service.login("admin", "demo123").await;
        assert!(service.has_permission(&[Role::Admin]));
        assert!(service.has_action_permission("users.create"));

        service.logout().await;
        assert!(!service.has_action_permission("users.create"));
    }
}
