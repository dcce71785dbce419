use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    Dispatcher,
    Driver,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Dispatcher => "dispatcher",
            Role::Driver => "driver",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "admin" => Some(Role::Admin),
            "manager" => Some(Role::Manager),
            "dispatcher" => Some(Role::Dispatcher),
            "driver" => Some(Role::Driver),
            _ => None,
        }
    }
}

// Unknown roles from external rows normalize to the least-privileged role.
impl<'de> Deserialize<'de> for Role {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Role::parse(&raw).unwrap_or_else(|| {
            tracing::warn!(value = %raw, "unknown role, defaulting to driver");
            Role::Driver
        }))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::Role;

    #[test]
    fn unknown_role_normalizes_to_driver() {
        let parsed: Role = serde_json::from_value(serde_json::json!("superuser")).unwrap();
        assert_eq!(parsed, Role::Driver);
    }

    #[test]
    fn known_roles_parse_exactly() {
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("dispatcher"), Some(Role::Dispatcher));
        assert_eq!(Role::parse("Admin"), None);
    }
}
