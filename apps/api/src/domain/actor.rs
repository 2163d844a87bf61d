use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of the operator performing a core call
///
/// Passed explicitly into every mutating operation; there is no ambient
/// session state in the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    /// Event organizer with restricted privileges
    Organizer,
    /// Federation administrator
    Admin,
    /// Superuser
    Super,
}

impl ActorRole {
    /// Whether this role may set a paid registration back to unpaid
    pub fn can_revoke_payment(&self) -> bool {
        matches!(self, ActorRole::Admin | ActorRole::Super)
    }
}

impl fmt::Display for ActorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActorRole::Organizer => write!(f, "organizer"),
            ActorRole::Admin => write!(f, "admin"),
            ActorRole::Super => write!(f, "super"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_privileged_roles_revoke_payment() {
        assert!(!ActorRole::Organizer.can_revoke_payment());
        assert!(ActorRole::Admin.can_revoke_payment());
        assert!(ActorRole::Super.can_revoke_payment());
    }

    #[test]
    fn role_serializes_snake_case() {
        let json = serde_json::to_string(&ActorRole::Organizer).unwrap();
        assert_eq!(json, "\"organizer\"");
    }
}
