use crate::models::user::Role;

/// Action -> roles allowed to perform it. Unknown actions are denied.
pub const ACTION_RULES: &[(&str, &[Role])] = &[
    ("users.create", &[Role::Admin]),
    ("users.update", &[Role::Admin, Role::Manager]),
    ("users.delete", &[Role::Admin]),
    ("deliveries.create", &[Role::Admin, Role::Dispatcher]),
    ("deliveries.update", &[Role::Admin, Role::Dispatcher]),
    ("routes.create", &[Role::Admin, Role::Dispatcher]),
    ("fleet.manage", &[Role::Admin, Role::Manager]),
    ("maintenance.schedule", &[Role::Admin, Role::Manager]),
    ("reports.view", &[Role::Admin, Role::Manager, Role::Dispatcher]),
];

/// Navigation path -> roles allowed to open it. An empty list means the page
/// is open to everyone. Admin access to every path is encoded in
/// [`route_allows`], not here.
pub const ROUTE_RULES: &[(&str, &[Role])] = &[
    ("/dashboard", &[]),
    ("/map", &[]),
    ("/orders", &[Role::Admin, Role::Dispatcher]),
    ("/deliveries", &[Role::Admin, Role::Dispatcher, Role::Driver]),
    ("/fleet", &[Role::Admin, Role::Manager]),
    ("/drivers", &[Role::Admin, Role::Manager]),
    ("/inventory", &[Role::Admin, Role::Manager]),
    ("/maintenance", &[Role::Admin, Role::Manager]),
    ("/reports", &[Role::Admin, Role::Manager]),
    ("/users", &[Role::Admin]),
];

/// An empty required set allows everyone, including anonymous callers.
/// A non-empty set requires an authenticated user whose role is a member.
pub fn permitted(role: Option<Role>, required: &[Role]) -> bool {
    if required.is_empty() {
        return true;
    }
    match role {
        Some(role) => required.contains(&role),
        None => false,
    }
}

pub fn action_allows(role: Option<Role>, action: &str) -> bool {
    match ACTION_RULES.iter().find(|(name, _)| *name == action) {
        Some((_, allowed)) => permitted(role, allowed),
        None => false,
    }
}

pub fn route_allows(role: Option<Role>, path: &str) -> bool {
    // admin can access everything
    if role == Some(Role::Admin) {
        return true;
    }
    match ROUTE_RULES.iter().find(|(route, _)| *route == path) {
        Some((_, required)) => permitted(role, required),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_required_set_allows_anyone() {
        assert!(permitted(None, &[]));
        assert!(permitted(Some(Role::Driver), &[]));
    }

    #[test]
    fn anonymous_is_denied_any_non_empty_set() {
        assert!(!permitted(None, &[Role::Admin]));
        assert!(!permitted(None, &[Role::Admin, Role::Manager, Role::Dispatcher, Role::Driver]));
    }

    #[test]
    fn membership_is_required_for_non_empty_sets() {
        assert!(permitted(Some(Role::Admin), &[Role::Admin]));
        assert!(!permitted(Some(Role::Driver), &[Role::Admin]));
    }

    #[test]
    fn unknown_action_is_denied_even_for_admin() {
        assert!(!action_allows(Some(Role::Admin), "users.impersonate"));
    }

    #[test]
    fn action_table_gates_by_role() {
        assert!(action_allows(Some(Role::Admin), "users.create"));
        assert!(!action_allows(Some(Role::Dispatcher), "users.create"));
        assert!(action_allows(Some(Role::Dispatcher), "deliveries.create"));
        assert!(!action_allows(None, "deliveries.create"));
    }

    #[test]
    fn admin_can_open_every_route() {
        for (path, _) in ROUTE_RULES {
            assert!(route_allows(Some(Role::Admin), path));
        }
        assert!(route_allows(Some(Role::Admin), "/not-in-the-table"));
    }

    #[test]
    fn route_table_gates_other_roles() {
        assert!(route_allows(Some(Role::Driver), "/dashboard"));
        assert!(route_allows(Some(Role::Driver), "/deliveries"));
        assert!(!route_allows(Some(Role::Driver), "/users"));
        assert!(!route_allows(Some(Role::Manager), "/unknown"));
    }
}
