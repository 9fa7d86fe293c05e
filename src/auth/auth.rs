use crate::auth::middleware::authenticate;
use crate::config::Config;
use crate::error::AppError;
use crate::model::role::Role;
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, web::Data};
use futures::future::{Ready, ready};

/// The authenticated principal, as carried by the access token. Role and
/// department are snapshots from login time; tokens are not revoked when a
/// user record changes, they simply age out.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub department: String,
}

/// Which leave requests a principal may list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaveScope {
    /// Admins see every request.
    All,
    /// Managers see their own department only.
    Department(String),
    /// Employees see requests they submitted.
    Mine(u64),
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // The protected scope's middleware has usually done the work already.
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        // Routes outside that scope (GET /api/auth/me) authenticate here.
        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => {
                return ready(Err(actix_web::error::ErrorInternalServerError(
                    "App config missing",
                )));
            }
        };

        ready(authenticate(req.headers(), config).map_err(Into::into))
    }
}

impl AuthUser {
    /// Submitting a leave request is an employee action. Managers and admins
    /// administer leave, they do not file it through this endpoint.
    pub fn require_employee(&self) -> Result<(), AppError> {
        if self.role == Role::Employee {
            Ok(())
        } else {
            Err(AppError::forbidden(
                "Only employees can create leave requests",
            ))
        }
    }

    /// Resolution is a manager power scoped to the manager's own department.
    /// Admins deliberately fall through to the role check: they administer
    /// users and holidays but do not approve leave.
    pub fn require_manager_for(&self, department: &str) -> Result<(), AppError> {
        if self.role != Role::Manager {
            return Err(AppError::forbidden("Only managers can update leave requests"));
        }
        if self.department != department {
            return Err(AppError::forbidden(
                "Not authorized to update this leave request",
            ));
        }
        Ok(())
    }

    /// `action` names the blocked operation, e.g. "create holidays".
    pub fn require_admin(&self, action: &str) -> Result<(), AppError> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(AppError::forbidden(format!(
                "Only administrators can {action}"
            )))
        }
    }

    pub fn leave_scope(&self) -> LeaveScope {
        match self.role {
            Role::Admin => LeaveScope::All,
            Role::Manager => LeaveScope::Department(self.department.clone()),
            Role::Employee => LeaveScope::Mine(self.user_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(role: Role, department: &str) -> AuthUser {
        AuthUser {
            user_id: 11,
            email: "person@company.com".into(),
            name: "Person".into(),
            role,
            department: department.into(),
        }
    }

    #[test]
    fn only_employees_submit() {
        assert!(principal(Role::Employee, "Sales").require_employee().is_ok());
        assert!(principal(Role::Manager, "Sales").require_employee().is_err());
        assert!(principal(Role::Admin, "Sales").require_employee().is_err());
    }

    #[test]
    fn resolution_needs_manager_role_and_matching_department() {
        let manager = principal(Role::Manager, "Engineering");
        assert!(manager.require_manager_for("Engineering").is_ok());
        assert!(manager.require_manager_for("Sales").is_err());

        // Admins cannot resolve, even for any department.
        let admin = principal(Role::Admin, "Engineering");
        assert!(admin.require_manager_for("Engineering").is_err());

        let employee = principal(Role::Employee, "Engineering");
        assert!(employee.require_manager_for("Engineering").is_err());
    }

    #[test]
    fn admin_gate_names_the_action() {
        let err = principal(Role::Manager, "Sales")
            .require_admin("delete users")
            .unwrap_err();
        assert_eq!(err.to_string(), "Only administrators can delete users");
    }

    #[test]
    fn listing_scope_narrows_by_role() {
        assert_eq!(principal(Role::Admin, "HR").leave_scope(), LeaveScope::All);
        assert_eq!(
            principal(Role::Manager, "HR").leave_scope(),
            LeaveScope::Department("HR".into())
        );
        assert_eq!(
            principal(Role::Employee, "HR").leave_scope(),
            LeaveScope::Mine(11)
        );
    }
}
