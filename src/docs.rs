use crate::api::holiday::{CreateHoliday, UpdateHoliday};
use crate::api::leave::{CreateLeave, ResolveLeave};
use crate::api::user::{BalancePatch, UpdateUser};
use crate::auth::handlers::AuthResponse;
use crate::model::holiday::{Holiday, HolidayType};
use crate::model::leave_request::{LeaveRequestView, LeaveStatus, LeaveType};
use crate::model::role::Role;
use crate::model::user::{LeaveBalance, UserView};
use crate::models::{LoginReq, RegisterReq};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Leave Management API",
        version = "1.0.0",
        description = r#"
## Online Leave Management System

This API powers an **HR leave management** service for employees, managers and administrators.

### 🔹 Key Features
- **Leave Requests**
  - Submit requests, view them role-scoped, approve or reject as the department manager
- **Leave Balances**
  - Per-type day balances debited atomically on approval
- **Holidays**
  - Company calendar with conflict checking against new requests
- **User Management**
  - Administrator-only account management
- **Real-time Notifications**
  - WebSocket fan-out at `/ws?token=` for leave, holiday, user and system events

### 🔐 Security
Endpoints are protected with **JWT Bearer authentication**. Role and department
determine what each caller may see and do.

### 📦 Response Format
- JSON-based RESTful responses, camelCase field names
- Errors carry a `message` field; holiday conflicts also carry the offending `holidays`

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::auth::handlers::register,
        crate::auth::handlers::login,
        crate::auth::handlers::me,

        crate::api::leave::create_leave,
        crate::api::leave::list_leaves,
        crate::api::leave::get_leave,
        crate::api::leave::resolve_leave,

        crate::api::holiday::list_holidays,
        crate::api::holiday::create_holiday,
        crate::api::holiday::update_holiday,
        crate::api::holiday::delete_holiday,

        crate::api::user::list_users,
        crate::api::user::get_user,
        crate::api::user::create_user,
        crate::api::user::update_user,
        crate::api::user::delete_user
    ),
    components(
        schemas(
            RegisterReq,
            LoginReq,
            AuthResponse,
            Role,
            UserView,
            LeaveBalance,
            BalancePatch,
            UpdateUser,
            LeaveType,
            LeaveStatus,
            LeaveRequestView,
            CreateLeave,
            ResolveLeave,
            HolidayType,
            Holiday,
            CreateHoliday,
            UpdateHoliday
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Registration, sign-in and the current principal"),
        (name = "leaves", description = "Leave request lifecycle APIs"),
        (name = "holidays", description = "Holiday calendar APIs"),
        (name = "users", description = "Administrator user management APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_token",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
