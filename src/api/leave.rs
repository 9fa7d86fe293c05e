use crate::auth::auth::{AuthUser, LeaveScope};
use crate::error::AppError;
use crate::leave::{ledger, validate};
use crate::model::leave_request::{LeaveRequest, LeaveRequestView, LeaveStatus, LeaveType};
use crate::notify::{event::Event, hub::Hub};
use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::MySqlPool;
use utoipa::ToSchema;

const LEAVE_COLUMNS: &str = "id, employee_id, leave_type, start_date, end_date, reason, status, \
     total_days, department, manager_id, manager_note, created_at, updated_at";

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateLeave {
    #[schema(example = "2025-03-10", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2025-03-12", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "annual")]
    pub leave_type: LeaveType,
    #[schema(example = "Family event")]
    pub reason: String,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResolveLeave {
    #[schema(example = "approved")]
    pub status: LeaveStatus,
    #[schema(example = "Enjoy!", nullable = true)]
    pub manager_note: Option<String>,
}

async fn fetch_request(pool: &MySqlPool, id: u64) -> Result<Option<LeaveRequest>, AppError> {
    let request = sqlx::query_as::<_, LeaveRequest>(&format!(
        "SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(request)
}

async fn employee_name(pool: &MySqlPool, employee_id: u64) -> Result<String, AppError> {
    let name = sqlx::query_scalar::<_, String>("SELECT name FROM users WHERE id = ?")
        .bind(employee_id)
        .fetch_optional(pool)
        .await?;

    Ok(name.unwrap_or_default())
}

async fn department_manager_ids(pool: &MySqlPool, department: &str) -> Result<Vec<u64>, AppError> {
    let ids = sqlx::query_scalar::<_, u64>(
        "SELECT id FROM users WHERE role = 'manager' AND department = ?",
    )
    .bind(department)
    .fetch_all(pool)
    .await?;

    Ok(ids)
}

/* =========================
Submit leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/leaves",
    request_body = CreateLeave,
    responses(
        (status = 201, description = "Leave request created", body = LeaveRequestView),
        (status = 400, description = "Validation failure, holiday overlap or insufficient balance"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller is not an employee"),
    ),
    security(("bearer_token" = [])),
    tag = "leaves"
)]
pub async fn create_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    hub: web::Data<Hub>,
    payload: web::Json<CreateLeave>,
) -> Result<HttpResponse, AppError> {
    auth.require_employee()?;

    let total_days = validate::total_days(payload.start_date, payload.end_date)?;
    validate::validate_reason(&payload.reason)?;

    // Holiday overlap blocks the request outright; the response carries the
    // conflicting holidays so the client can show them.
    let holidays =
        super::holiday::holidays_in_range(pool.get_ref(), payload.start_date, payload.end_date)
            .await?;
    if !holidays.is_empty() {
        return Err(AppError::HolidayConflict {
            message: "Leave request overlaps with holidays".into(),
            holidays,
        });
    }

    // Informational check: gives an exact message now, while approval later
    // re-checks atomically against whatever the balance is then.
    let remaining = ledger::remaining(pool.get_ref(), auth.user_id, payload.leave_type).await?;
    if remaining < total_days {
        return Err(AppError::validation(format!(
            "Insufficient {} leave balance. You have {} days remaining.",
            payload.leave_type, remaining
        )));
    }

    let inserted = sqlx::query(
        "INSERT INTO leave_requests \
             (employee_id, leave_type, start_date, end_date, reason, status, total_days, department) \
         VALUES (?, ?, ?, ?, ?, 'pending', ?, ?)",
    )
    .bind(auth.user_id)
    .bind(payload.leave_type)
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(payload.reason.trim())
    .bind(total_days)
    .bind(&auth.department)
    .execute(pool.get_ref())
    .await?;

    let request = fetch_request(pool.get_ref(), inserted.last_insert_id())
        .await?
        .ok_or(AppError::Internal)?;

    tracing::info!(
        leave_id = request.id,
        employee_id = auth.user_id,
        total_days,
        "Leave request submitted"
    );

    let view = LeaveRequestView::from(request);
    hub.dispatch(Event::LeaveSubmitted {
        request: view.clone(),
        employee_name: auth.name.clone(),
    });

    Ok(HttpResponse::Created().json(view))
}

/* =========================
List leave requests (role-scoped)
========================= */
#[utoipa::path(
    get,
    path = "/api/leaves",
    responses(
        (status = 200, description = "Requests visible to the caller, newest first",
         body = [LeaveRequestView]),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_token" = [])),
    tag = "leaves"
)]
pub async fn list_leaves(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, AppError> {
    let scope = auth.leave_scope();

    let mut sql = format!("SELECT {LEAVE_COLUMNS} FROM leave_requests");
    match &scope {
        LeaveScope::All => {}
        LeaveScope::Department(_) => sql.push_str(" WHERE department = ?"),
        LeaveScope::Mine(_) => sql.push_str(" WHERE employee_id = ?"),
    }
    sql.push_str(" ORDER BY created_at DESC");

    let mut query = sqlx::query_as::<_, LeaveRequest>(&sql);
    query = match &scope {
        LeaveScope::All => query,
        LeaveScope::Department(department) => query.bind(department),
        LeaveScope::Mine(employee_id) => query.bind(employee_id),
    };

    let requests = query.fetch_all(pool.get_ref()).await?;
    let views: Vec<LeaveRequestView> = requests.into_iter().map(Into::into).collect();

    Ok(HttpResponse::Ok().json(views))
}

/* =========================
Get one leave request
========================= */
#[utoipa::path(
    get,
    path = "/api/leaves/{id}",
    params(("id" = u64, Path, description = "Leave request id")),
    responses(
        (status = 200, description = "Leave request", body = LeaveRequestView),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Outside the caller's scope"),
        (status = 404, description = "No such request"),
    ),
    security(("bearer_token" = [])),
    tag = "leaves"
)]
pub async fn get_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    let request = fetch_request(pool.get_ref(), path.into_inner())
        .await?
        .ok_or_else(|| AppError::not_found("Leave request not found"))?;

    if !request.visible_to(auth.role, auth.user_id, &auth.department) {
        return Err(AppError::forbidden("Not authorized to view this leave request"));
    }

    Ok(HttpResponse::Ok().json(LeaveRequestView::from(request)))
}

/* =========================
Resolve leave request (manager)
========================= */
#[utoipa::path(
    patch,
    path = "/api/leaves/{id}",
    params(("id" = u64, Path, description = "Leave request id")),
    request_body = ResolveLeave,
    responses(
        (status = 200, description = "Updated request", body = LeaveRequestView),
        (status = 400, description = "Invalid status or insufficient balance"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the department's manager"),
        (status = 404, description = "No such request"),
        (status = 409, description = "Already processed"),
    ),
    security(("bearer_token" = [])),
    tag = "leaves"
)]
pub async fn resolve_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    hub: web::Data<Hub>,
    path: web::Path<u64>,
    payload: web::Json<ResolveLeave>,
) -> Result<HttpResponse, AppError> {
    let leave_id = path.into_inner();
    let decision = payload.status;

    if !matches!(decision, LeaveStatus::Approved | LeaveStatus::Rejected) {
        return Err(AppError::validation("Invalid status"));
    }

    let request = fetch_request(pool.get_ref(), leave_id)
        .await?
        .ok_or_else(|| AppError::not_found("Leave request not found"))?;

    auth.require_manager_for(&request.department)?;

    if request.status != LeaveStatus::Pending {
        return Err(AppError::Conflict(
            "Leave request has already been processed".into(),
        ));
    }

    let transition_sql = "UPDATE leave_requests SET status = ?, manager_id = ?, manager_note = ? \
         WHERE id = ? AND status = 'pending'";

    if decision == LeaveStatus::Approved {
        // Debit and transition must land together: the conditional debit
        // re-checks the balance, the conditional transition re-checks
        // pending, and losing either race rolls the whole thing back.
        let mut tx = pool.begin().await?;

        let debited = ledger::debit_if_sufficient(
            &mut tx,
            request.employee_id,
            request.leave_type,
            request.total_days,
        )
        .await?;
        if !debited {
            tx.rollback().await?;
            let remaining =
                ledger::remaining(pool.get_ref(), request.employee_id, request.leave_type).await?;
            return Err(AppError::validation(format!(
                "Insufficient {} leave balance. Employee has {} days remaining.",
                request.leave_type, remaining
            )));
        }

        let transitioned = sqlx::query(transition_sql)
            .bind(decision)
            .bind(auth.user_id)
            .bind(&payload.manager_note)
            .bind(leave_id)
            .execute(&mut *tx)
            .await?;
        if transitioned.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(AppError::Conflict(
                "Leave request has already been processed".into(),
            ));
        }

        tx.commit().await?;
    } else {
        // Rejection never touches balances, so a single conditional UPDATE
        // is the whole race check.
        let transitioned = sqlx::query(transition_sql)
            .bind(decision)
            .bind(auth.user_id)
            .bind(&payload.manager_note)
            .bind(leave_id)
            .execute(pool.get_ref())
            .await?;
        if transitioned.rows_affected() == 0 {
            return Err(AppError::Conflict(
                "Leave request has already been processed".into(),
            ));
        }
    }

    tracing::info!(
        leave_id,
        manager_id = auth.user_id,
        status = %decision,
        "Leave request resolved"
    );

    let updated = fetch_request(pool.get_ref(), leave_id)
        .await?
        .ok_or(AppError::Internal)?;

    let employee_name = employee_name(pool.get_ref(), updated.employee_id).await?;
    let manager_ids = department_manager_ids(pool.get_ref(), &updated.department).await?;

    let view = LeaveRequestView::from(updated);
    hub.dispatch(Event::LeaveResolved {
        request: view.clone(),
        employee_name,
        manager_ids,
    });

    Ok(HttpResponse::Ok().json(view))
}
