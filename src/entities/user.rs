use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Access roles, ranked from least to most privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Staff,
    Supervisor,
    Central,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Staff => "staff",
            Role::Supervisor => "supervisor",
            Role::Central => "central",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "staff" => Some(Role::Staff),
            "supervisor" => Some(Role::Supervisor),
            "central" => Some(Role::Central),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    /// Whether a user holding this role clears the given requirement.
    /// Roles are strictly ordered, so a higher role always qualifies.
    pub fn allows(&self, required: Role) -> bool {
        *self >= required
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    pub fn role(&self) -> Role {
        Role::parse(&self.role).unwrap_or(Role::Staff)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_ordering_allows_higher_roles() {
        assert!(Role::Admin.allows(Role::Staff));
        assert!(Role::Central.allows(Role::Supervisor));
        assert!(Role::Supervisor.allows(Role::Supervisor));
        assert!(!Role::Staff.allows(Role::Supervisor));
        assert!(!Role::Central.allows(Role::Admin));
    }

    #[test]
    fn role_round_trips_through_strings() {
        for role in [Role::Staff, Role::Supervisor, Role::Central, Role::Admin] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("mechanic"), None);
    }
}
