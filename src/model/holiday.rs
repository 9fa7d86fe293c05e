use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, sqlx::Type, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum HolidayType {
    Public,
    Company,
    Optional,
}

/// `is_recurring` is carried as data only; the conflict checker matches the
/// stored date and never projects recurring holidays into other years.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Holiday {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "New Year's Day")]
    pub name: String,
    #[schema(example = "2025-01-01", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    #[schema(example = "public", value_type = String)]
    pub kind: HolidayType,
    #[schema(example = "First day of the year", nullable = true)]
    pub description: Option<String>,
    pub is_recurring: bool,
    #[schema(example = 1)]
    pub created_by: u64,
    #[schema(example = "2026-01-01T00:00:00Z", format = "date-time", value_type = Option<String>)]
    pub created_at: Option<DateTime<Utc>>,
}
