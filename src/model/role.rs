use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, sqlx::Type, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    Employee,
    Manager,
    Admin,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn parses_known_roles() {
        assert_eq!(Role::from_str("employee"), Ok(Role::Employee));
        assert_eq!(Role::from_str("manager"), Ok(Role::Manager));
        assert_eq!(Role::from_str("admin"), Ok(Role::Admin));
    }

    #[test]
    fn rejects_unknown_role() {
        assert!(Role::from_str("hr").is_err());
    }

    #[test]
    fn displays_lowercase() {
        assert_eq!(Role::Manager.to_string(), "manager");
    }
}
