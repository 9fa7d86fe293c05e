use crate::auth::auth::AuthUser;
use crate::auth::handlers::fetch_user;
use crate::auth::password::hash_password;
use crate::error::AppError;
use crate::model::role::Role;
use crate::model::user::{User, UserView};
use crate::models::RegisterReq;
use crate::notify::{event::Event, hub::Hub};
use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct BalancePatch {
    pub annual: Option<u32>,
    pub sick: Option<u32>,
    pub casual: Option<u32>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
    #[schema(example = "manager")]
    pub role: Option<Role>,
    pub department: Option<String>,
    pub position: Option<String>,
    #[schema(format = "date", value_type = Option<String>)]
    pub joining_date: Option<NaiveDate>,
    /// Partial balance adjustment; absent fields keep their value.
    pub leave_balance: Option<BalancePatch>,
}

/* =========================
List users (admin)
========================= */
#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "All users", body = [UserView]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
    ),
    security(("bearer_token" = [])),
    tag = "users"
)]
pub async fn list_users(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin("view all users")?;

    let users = sqlx::query_as::<_, User>(
        "SELECT id, name, email, password, role, department, position, joining_date, \
                balance_annual, balance_sick, balance_casual, created_at \
         FROM users ORDER BY id ASC",
    )
    .fetch_all(pool.get_ref())
    .await?;

    let views: Vec<UserView> = users.into_iter().map(Into::into).collect();

    Ok(HttpResponse::Ok().json(views))
}

/* =========================
Get one user (admin)
========================= */
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = u64, Path, description = "User id")),
    responses(
        (status = 200, description = "User", body = UserView),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "No such user"),
    ),
    security(("bearer_token" = [])),
    tag = "users"
)]
pub async fn get_user(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin("view user details")?;

    let user = fetch_user(pool.get_ref(), path.into_inner())
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    Ok(HttpResponse::Ok().json(UserView::from(user)))
}

/* =========================
Create user (admin)
========================= */
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = RegisterReq,
    responses(
        (status = 201, description = "Created user", body = UserView),
        (status = 400, description = "Missing fields"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 409, description = "Email already registered"),
    ),
    security(("bearer_token" = [])),
    tag = "users"
)]
pub async fn create_user(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    hub: web::Data<Hub>,
    payload: web::Json<RegisterReq>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin("create users")?;

    let name = payload.name.trim();
    let email = payload.email.trim().to_lowercase();
    let department = payload.department.trim();

    if name.is_empty() || email.is_empty() || payload.password.is_empty() || department.is_empty() {
        return Err(AppError::validation(
            "Name, email, password and department are required",
        ));
    }

    let hashed = hash_password(&payload.password);

    let result = sqlx::query(
        "INSERT INTO users (name, email, password, role, department, position, joining_date) \
         VALUES (?, ?, ?, ?, ?, 'Employee', CURDATE())",
    )
    .bind(name)
    .bind(&email)
    .bind(&hashed)
    .bind(payload.role)
    .bind(department)
    .execute(pool.get_ref())
    .await;

    let inserted = match result {
        Ok(r) => r,
        Err(sqlx::Error::Database(db_err)) if db_err.code().as_deref() == Some("23000") => {
            return Err(AppError::Conflict("User already exists".into()));
        }
        Err(e) => return Err(e.into()),
    };

    let user = fetch_user(pool.get_ref(), inserted.last_insert_id())
        .await?
        .ok_or(AppError::Internal)?;

    tracing::info!(user_id = user.id, admin_id = auth.user_id, "User created");

    let view = UserView::from(user);
    hub.dispatch(Event::UserCreated { user: view.clone() });

    Ok(HttpResponse::Created().json(view))
}

/* =========================
Update user (admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    params(("id" = u64, Path, description = "User id")),
    request_body = UpdateUser,
    responses(
        (status = 200, description = "Updated user", body = UserView),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "No such user"),
        (status = 409, description = "Email already in use"),
    ),
    security(("bearer_token" = [])),
    tag = "users"
)]
pub async fn update_user(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<UpdateUser>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin("update users")?;

    let user_id = path.into_inner();
    fetch_user(pool.get_ref(), user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    // Column list comes from code; the payload only supplies values.
    let mut sets: Vec<&str> = Vec::new();
    if payload.name.is_some() {
        sets.push("name = ?");
    }
    if payload.email.is_some() {
        sets.push("email = ?");
    }
    if payload.role.is_some() {
        sets.push("role = ?");
    }
    if payload.department.is_some() {
        sets.push("department = ?");
    }
    if payload.position.is_some() {
        sets.push("position = ?");
    }
    if payload.joining_date.is_some() {
        sets.push("joining_date = ?");
    }
    if let Some(balance) = &payload.leave_balance {
        if balance.annual.is_some() {
            sets.push("balance_annual = ?");
        }
        if balance.sick.is_some() {
            sets.push("balance_sick = ?");
        }
        if balance.casual.is_some() {
            sets.push("balance_casual = ?");
        }
    }

    if !sets.is_empty() {
        let sql = format!("UPDATE users SET {} WHERE id = ?", sets.join(", "));
        let mut query = sqlx::query(&sql);
        if let Some(name) = &payload.name {
            query = query.bind(name.trim());
        }
        if let Some(email) = &payload.email {
            query = query.bind(email.trim().to_lowercase());
        }
        if let Some(role) = payload.role {
            query = query.bind(role);
        }
        if let Some(department) = &payload.department {
            query = query.bind(department.trim());
        }
        if let Some(position) = &payload.position {
            query = query.bind(position.trim());
        }
        if let Some(joining_date) = payload.joining_date {
            query = query.bind(joining_date);
        }
        if let Some(balance) = &payload.leave_balance {
            if let Some(annual) = balance.annual {
                query = query.bind(annual);
            }
            if let Some(sick) = balance.sick {
                query = query.bind(sick);
            }
            if let Some(casual) = balance.casual {
                query = query.bind(casual);
            }
        }

        let result = query.bind(user_id).execute(pool.get_ref()).await;
        if let Err(sqlx::Error::Database(db_err)) = &result {
            if db_err.code().as_deref() == Some("23000") {
                return Err(AppError::Conflict("Email already in use".into()));
            }
        }
        result?;
    }

    let updated = fetch_user(pool.get_ref(), user_id)
        .await?
        .ok_or(AppError::Internal)?;

    tracing::info!(user_id, admin_id = auth.user_id, "User updated");

    Ok(HttpResponse::Ok().json(UserView::from(updated)))
}

/* =========================
Delete user (admin)
========================= */
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = u64, Path, description = "User id")),
    responses(
        (status = 200, description = "User removed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "No such user"),
        (status = 409, description = "User still owns leave requests"),
    ),
    security(("bearer_token" = [])),
    tag = "users"
)]
pub async fn delete_user(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin("delete users")?;

    let user_id = path.into_inner();
    fetch_user(pool.get_ref(), user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user_id)
        .execute(pool.get_ref())
        .await;

    match result {
        Ok(_) => {}
        // Leave history is never deleted, so a user with requests on record
        // trips the foreign key instead of cascading.
        Err(sqlx::Error::Database(db_err)) if db_err.code().as_deref() == Some("23000") => {
            return Err(AppError::Conflict(
                "Cannot delete a user with leave requests on record".into(),
            ));
        }
        Err(e) => return Err(e.into()),
    }

    tracing::info!(user_id, admin_id = auth.user_id, "User deleted");

    Ok(HttpResponse::Ok().json(json!({ "message": "User removed successfully" })))
}
