use crate::model::role::Role;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Full row, password hash included. Never serialized to clients directly;
/// responses go through [`UserView`].
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub department: String,
    pub position: Option<String>,
    pub joining_date: Option<NaiveDate>,
    pub balance_annual: u32,
    pub balance_sick: u32,
    pub balance_casual: u32,
    pub created_at: Option<DateTime<Utc>>,
}

/// Per-type day balances as the client sees them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct LeaveBalance {
    #[schema(example = 20)]
    pub annual: u32,
    #[schema(example = 10)]
    pub sick: u32,
    #[schema(example = 10)]
    pub casual: u32,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "Jane Doe")]
    pub name: String,
    #[schema(example = "jane@company.com")]
    pub email: String,
    #[schema(example = "employee", value_type = String)]
    pub role: Role,
    #[schema(example = "Engineering")]
    pub department: String,
    #[schema(example = "Developer", nullable = true)]
    pub position: Option<String>,
    #[schema(example = "2024-01-01", format = "date", value_type = Option<String>)]
    pub joining_date: Option<NaiveDate>,
    pub leave_balance: LeaveBalance,
    #[schema(example = "2026-01-01T00:00:00Z", format = "date-time", value_type = Option<String>)]
    pub created_at: Option<DateTime<Utc>>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        UserView {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            department: user.department,
            position: user.position,
            joining_date: user.joining_date,
            leave_balance: LeaveBalance {
                annual: user.balance_annual,
                sick: user.balance_sick,
                casual: user.balance_casual,
            },
            created_at: user.created_at,
        }
    }
}
