use crate::model::role::Role;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Hash,
    Serialize,
    Deserialize,
    sqlx::Type,
    Display,
    EnumString,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveType {
    Annual,
    Sick,
    Casual,
}

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, sqlx::Type, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

/// A processed request keeps whatever status the first resolution set;
/// there is no transition out of `Approved` or `Rejected`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LeaveRequest {
    pub id: u64,
    pub employee_id: u64,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
    pub status: LeaveStatus,
    pub total_days: u32,
    pub department: String,
    pub manager_id: Option<u64>,
    pub manager_note: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl LeaveRequest {
    /// Record-level visibility: admins see everything, managers their own
    /// department, employees their own requests.
    pub fn visible_to(&self, role: Role, user_id: u64, department: &str) -> bool {
        match role {
            Role::Admin => true,
            Role::Manager => self.department == department,
            Role::Employee => self.employee_id == user_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRequestView {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "annual", value_type = String)]
    pub leave_type: LeaveType,
    #[schema(example = "2025-03-10", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2025-03-12", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "Family event")]
    pub reason: String,
    #[schema(example = "pending", value_type = String)]
    pub status: LeaveStatus,
    #[schema(example = 3)]
    pub total_days: u32,
    #[schema(example = "Engineering")]
    pub department: String,
    #[schema(example = 2000, nullable = true)]
    pub manager_id: Option<u64>,
    #[schema(example = "Enjoy!", nullable = true)]
    pub manager_note: Option<String>,
    #[schema(example = "2026-01-01T00:00:00Z", format = "date-time", value_type = Option<String>)]
    pub created_at: Option<DateTime<Utc>>,
    #[schema(example = "2026-01-01T00:00:00Z", format = "date-time", value_type = Option<String>)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<LeaveRequest> for LeaveRequestView {
    fn from(request: LeaveRequest) -> Self {
        LeaveRequestView {
            id: request.id,
            employee_id: request.employee_id,
            leave_type: request.leave_type,
            start_date: request.start_date,
            end_date: request.end_date,
            reason: request.reason,
            status: request.status,
            total_days: request.total_days,
            department: request.department,
            manager_id: request.manager_id,
            manager_note: request.manager_note,
            created_at: request.created_at,
            updated_at: request.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(employee_id: u64, department: &str) -> LeaveRequest {
        LeaveRequest {
            id: 1,
            employee_id,
            leave_type: LeaveType::Annual,
            start_date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 3, 12).unwrap(),
            reason: "Family event".into(),
            status: LeaveStatus::Pending,
            total_days: 3,
            department: department.into(),
            manager_id: None,
            manager_note: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn admin_sees_any_record() {
        assert!(request(7, "IT").visible_to(Role::Admin, 1, "HR"));
    }

    #[test]
    fn manager_scope_is_the_department() {
        let record = request(7, "IT");
        assert!(record.visible_to(Role::Manager, 2, "IT"));
        assert!(!record.visible_to(Role::Manager, 2, "HR"));
    }

    #[test]
    fn employee_sees_only_own_records() {
        let record = request(7, "IT");
        assert!(record.visible_to(Role::Employee, 7, "IT"));
        assert!(!record.visible_to(Role::Employee, 8, "IT"));
    }
}
