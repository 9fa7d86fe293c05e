use crate::{
    auth::{
        auth::AuthUser,
        jwt::generate_access_token,
        password::{hash_password, verify_password},
    },
    config::Config,
    error::AppError,
    model::user::{User, UserView},
    models::{LoginReq, RegisterReq},
    notify::{event::Event, hub::Hub},
};
use actix_web::{HttpResponse, web};
use serde::Serialize;
use sqlx::MySqlPool;
use tracing::{debug, info, instrument};
use utoipa::ToSchema;

const USER_COLUMNS: &str = "id, name, email, password, role, department, position, \
     joining_date, balance_annual, balance_sick, balance_casual, created_at";

pub(crate) async fn fetch_user(pool: &MySqlPool, id: u64) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

#[derive(Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserView,
}

/// Create an account and sign the caller in.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterReq,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Missing fields"),
        (status = 409, description = "Email already registered"),
    ),
    tag = "auth"
)]
pub async fn register(
    body: web::Json<RegisterReq>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    hub: web::Data<Hub>,
) -> Result<HttpResponse, AppError> {
    let req = body.into_inner();
    let name = req.name.trim();
    let email = req.email.trim().to_lowercase();
    let department = req.department.trim();

    if name.is_empty() || email.is_empty() || req.password.is_empty() || department.is_empty() {
        return Err(AppError::validation(
            "Name, email, password and department are required",
        ));
    }

    let hashed = hash_password(&req.password);

    let result = sqlx::query(
        "INSERT INTO users (name, email, password, role, department, joining_date) \
         VALUES (?, ?, ?, ?, ?, CURDATE())",
    )
    .bind(name)
    .bind(&email)
    .bind(&hashed)
    .bind(req.role)
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

    info!(user_id = user.id, "User registered");

    let token = generate_access_token(&user, &config.jwt_secret, config.access_token_ttl);
    let view = UserView::from(user);

    hub.dispatch(Event::UserCreated { user: view.clone() });

    Ok(HttpResponse::Created().json(AuthResponse { token, user: view }))
}

/// Exchange credentials for an access token.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginReq,
    responses(
        (status = 200, description = "Signed in", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
    ),
    tag = "auth"
)]
#[instrument(name = "auth_login", skip(body, pool, config), fields(email = %body.email))]
pub async fn login(
    body: web::Json<LoginReq>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    if body.email.trim().is_empty() || body.password.is_empty() {
        return Err(AppError::validation("Email and password are required"));
    }

    debug!("Fetching user");

    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
    ))
    .bind(body.email.trim().to_lowercase())
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or_else(|| AppError::Unauthenticated("Invalid credentials".into()))?;

    if verify_password(&body.password, &user.password).is_err() {
        info!(user_id = user.id, "Password mismatch");
        return Err(AppError::Unauthenticated("Invalid credentials".into()));
    }

    info!(user_id = user.id, "Login successful");

    let token = generate_access_token(&user, &config.jwt_secret, config.access_token_ttl);

    Ok(HttpResponse::Ok().json(AuthResponse {
        token,
        user: UserView::from(user),
    }))
}

/// Current principal, freshly loaded so balance edits show up immediately.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "The signed-in user", body = UserView),
        (status = 401, description = "Not signed in"),
        (status = 404, description = "Account no longer exists"),
    ),
    security(("bearer_token" = [])),
    tag = "auth"
)]
pub async fn me(user: AuthUser, pool: web::Data<MySqlPool>) -> Result<HttpResponse, AppError> {
    let row = fetch_user(pool.get_ref(), user.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    Ok(HttpResponse::Ok().json(UserView::from(row)))
}
