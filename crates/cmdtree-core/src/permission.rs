//! Permission gate consulted while walking the tree.

/// Host-supplied permission check.
///
/// The engine never calls this with an empty permission string; empty
/// permissions always pass.
pub trait PermissionGate<S>: Send + Sync {
    fn has_permission(&self, sender: &S, permission: &str) -> bool;
}

impl<S, F> PermissionGate<S> for F
where
    F: Fn(&S, &str) -> bool + Send + Sync,
{
    fn has_permission(&self, sender: &S, permission: &str) -> bool {
        self(sender, permission)
    }
}

/// Gate that grants everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl<S> PermissionGate<S> for AllowAll {
    fn has_permission(&self, _sender: &S, _permission: &str) -> bool {
        true
    }
}

/// Check a single permission, short-circuiting the empty permission.
pub fn check<S>(gate: &dyn PermissionGate<S>, sender: &S, permission: &str) -> bool {
    permission.is_empty() || gate.has_permission(sender, permission)
}

/// Aggregate requirement for reaching a tree node: the sender may enter if
/// it may run at least one command below the node.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NodePermission {
    #[default]
    Unrestricted,
    AnyOf(Vec<String>),
}

impl NodePermission {
    /// Build from the permissions of every command below a node.
    pub fn from_commands<'a>(permissions: impl IntoIterator<Item = &'a str>) -> Self {
        let mut any_of: Vec<String> = Vec::new();
        for p in permissions {
            if p.is_empty() {
                return NodePermission::Unrestricted;
            }
            if !any_of.iter().any(|e| e == p) {
                any_of.push(p.to_string());
            }
        }
        if any_of.is_empty() {
            NodePermission::Unrestricted
        } else {
            NodePermission::AnyOf(any_of)
        }
    }

    pub fn allows<S>(&self, gate: &dyn PermissionGate<S>, sender: &S) -> bool {
        match self {
            NodePermission::Unrestricted => true,
            NodePermission::AnyOf(perms) => perms.iter().any(|p| check(gate, sender, p)),
        }
    }

    /// The permission reported when access is denied.
    pub fn describe(&self) -> String {
        match self {
            NodePermission::Unrestricted => String::new(),
            NodePermission::AnyOf(perms) => perms.join(" | "),
        }
    }
}
