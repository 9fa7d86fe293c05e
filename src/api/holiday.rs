use crate::auth::auth::AuthUser;
use crate::error::AppError;
use crate::model::holiday::{Holiday, HolidayType};
use crate::notify::{event::Event, hub::Hub};
use crate::utils::holiday_cache;
use actix_web::{HttpResponse, web};
use chrono::{Datelike, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

const HOLIDAY_COLUMNS: &str =
    "id, name, date, type, description, is_recurring, created_by, created_at";

/// Authoritative overlap query for the submission-time conflict check. Always
/// hits the database; the year cache serves listings only.
pub async fn holidays_in_range(
    pool: &MySqlPool,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<Holiday>, AppError> {
    let holidays = sqlx::query_as::<_, Holiday>(&format!(
        "SELECT {HOLIDAY_COLUMNS} FROM holidays WHERE date BETWEEN ? AND ? ORDER BY date ASC"
    ))
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;

    Ok(holidays)
}

async fn fetch_holiday(pool: &MySqlPool, id: u64) -> Result<Option<Holiday>, AppError> {
    let holiday = sqlx::query_as::<_, Holiday>(&format!(
        "SELECT {HOLIDAY_COLUMNS} FROM holidays WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(holiday)
}

fn parse_year(raw: Option<&str>) -> Result<i32, AppError> {
    let year = match raw {
        Some(text) => text
            .parse::<i32>()
            .map_err(|_| AppError::validation("Invalid year parameter"))?,
        None => Utc::now().year(),
    };

    if !(2000..=2100).contains(&year) {
        return Err(AppError::validation("Invalid year parameter"));
    }

    Ok(year)
}

#[derive(Deserialize, IntoParams)]
pub struct YearQuery {
    /// Four-digit year between 2000 and 2100; defaults to the current year.
    pub year: Option<String>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateHoliday {
    #[schema(example = "Founders Day")]
    pub name: String,
    #[schema(example = "2025-06-02", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[serde(rename = "type")]
    #[schema(example = "company")]
    pub kind: HolidayType,
    #[schema(example = "Company anniversary", nullable = true)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_recurring: bool,
    /// Announcement target; omitted means the whole organization.
    #[schema(example = "Engineering", nullable = true)]
    pub department: Option<String>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateHoliday {
    pub name: Option<String>,
    #[schema(format = "date", value_type = Option<String>)]
    pub date: Option<NaiveDate>,
    #[serde(rename = "type")]
    pub kind: Option<HolidayType>,
    pub description: Option<String>,
    pub is_recurring: Option<bool>,
    /// Announcement target for the update notice.
    pub department: Option<String>,
}

/* =========================
List holidays for a year
========================= */
#[utoipa::path(
    get,
    path = "/api/holidays",
    params(YearQuery),
    responses(
        (status = 200, description = "Holidays of the year, ascending by date", body = [Holiday]),
        (status = 400, description = "Invalid year parameter"),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_token" = [])),
    tag = "holidays"
)]
pub async fn list_holidays(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<YearQuery>,
) -> Result<HttpResponse, AppError> {
    let year = parse_year(query.year.as_deref())?;
    let holidays = holiday_cache::holidays_for_year(pool.get_ref(), year).await?;

    Ok(HttpResponse::Ok().json(&*holidays))
}

/* =========================
Create holiday (admin)
========================= */
#[utoipa::path(
    post,
    path = "/api/holidays",
    request_body = CreateHoliday,
    responses(
        (status = 201, description = "Created holiday", body = Holiday),
        (status = 400, description = "Validation failure"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
    ),
    security(("bearer_token" = [])),
    tag = "holidays"
)]
pub async fn create_holiday(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    hub: web::Data<Hub>,
    payload: web::Json<CreateHoliday>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin("create holidays")?;

    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::validation("Holiday name is required"));
    }

    let inserted = sqlx::query(
        "INSERT INTO holidays (name, date, type, description, is_recurring, created_by) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(name)
    .bind(payload.date)
    .bind(payload.kind)
    .bind(&payload.description)
    .bind(payload.is_recurring)
    .bind(auth.user_id)
    .execute(pool.get_ref())
    .await?;

    let holiday = fetch_holiday(pool.get_ref(), inserted.last_insert_id())
        .await?
        .ok_or(AppError::Internal)?;

    holiday_cache::invalidate_year(holiday.date.year()).await;

    tracing::info!(holiday_id = holiday.id, name = %holiday.name, "Holiday created");

    hub.dispatch(Event::HolidayAnnounced {
        holiday: holiday.clone(),
        department: payload.department.clone(),
    });

    Ok(HttpResponse::Created().json(holiday))
}

/* =========================
Update holiday (admin)
========================= */
#[utoipa::path(
    patch,
    path = "/api/holidays/{id}",
    params(("id" = u64, Path, description = "Holiday id")),
    request_body = UpdateHoliday,
    responses(
        (status = 200, description = "Updated holiday", body = Holiday),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "No such holiday"),
    ),
    security(("bearer_token" = [])),
    tag = "holidays"
)]
pub async fn update_holiday(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    hub: web::Data<Hub>,
    path: web::Path<u64>,
    payload: web::Json<UpdateHoliday>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin("update holidays")?;

    let holiday_id = path.into_inner();
    let existing = fetch_holiday(pool.get_ref(), holiday_id)
        .await?
        .ok_or_else(|| AppError::not_found("Holiday not found"))?;

    // Column list comes from code; the payload only supplies values.
    let mut sets: Vec<&str> = Vec::new();
    if payload.name.is_some() {
        sets.push("name = ?");
    }
    if payload.date.is_some() {
        sets.push("date = ?");
    }
    if payload.kind.is_some() {
        sets.push("type = ?");
    }
    if payload.description.is_some() {
        sets.push("description = ?");
    }
    if payload.is_recurring.is_some() {
        sets.push("is_recurring = ?");
    }
    // The updater takes ownership of the entry.
    sets.push("created_by = ?");

    let sql = format!("UPDATE holidays SET {} WHERE id = ?", sets.join(", "));
    let mut query = sqlx::query(&sql);
    if let Some(name) = &payload.name {
        query = query.bind(name.trim());
    }
    if let Some(date) = payload.date {
        query = query.bind(date);
    }
    if let Some(kind) = payload.kind {
        query = query.bind(kind);
    }
    if let Some(description) = &payload.description {
        query = query.bind(description);
    }
    if let Some(is_recurring) = payload.is_recurring {
        query = query.bind(is_recurring);
    }
    query.bind(auth.user_id).bind(holiday_id).execute(pool.get_ref()).await?;

    let updated = fetch_holiday(pool.get_ref(), holiday_id)
        .await?
        .ok_or(AppError::Internal)?;

    holiday_cache::invalidate_year(existing.date.year()).await;
    if updated.date.year() != existing.date.year() {
        holiday_cache::invalidate_year(updated.date.year()).await;
    }

    tracing::info!(holiday_id, name = %updated.name, "Holiday updated");

    hub.dispatch(Event::HolidayAnnounced {
        holiday: updated.clone(),
        department: payload.department.clone(),
    });

    Ok(HttpResponse::Ok().json(updated))
}

/* =========================
Delete holiday (admin)
========================= */
#[utoipa::path(
    delete,
    path = "/api/holidays/{id}",
    params(("id" = u64, Path, description = "Holiday id")),
    responses(
        (status = 200, description = "Holiday removed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "No such holiday"),
    ),
    security(("bearer_token" = [])),
    tag = "holidays"
)]
pub async fn delete_holiday(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin("delete holidays")?;

    let holiday_id = path.into_inner();
    let existing = fetch_holiday(pool.get_ref(), holiday_id)
        .await?
        .ok_or_else(|| AppError::not_found("Holiday not found"))?;

    sqlx::query("DELETE FROM holidays WHERE id = ?")
        .bind(holiday_id)
        .execute(pool.get_ref())
        .await?;

    holiday_cache::invalidate_year(existing.date.year()).await;

    tracing::info!(holiday_id, name = %existing.name, "Holiday deleted");

    Ok(HttpResponse::Ok().json(json!({ "message": "Holiday removed successfully" })))
}
