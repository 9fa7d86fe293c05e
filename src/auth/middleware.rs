use crate::auth::auth::AuthUser;
use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::error::AppError;
use crate::model::role::Role;
use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, ResponseError,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    http::header::{self, HeaderMap},
    web::Data,
};

/// Turns a raw bearer token into the request principal.
///
/// Also used by the websocket handshake, which carries the token in a
/// query parameter instead of a header.
pub fn user_from_token(token: &str, secret: &str) -> Result<AuthUser, AppError> {
    let claims = verify_token(token, secret)
        .map_err(|_| AppError::Unauthenticated("Invalid or expired token".into()))?;

    let role = claims
        .role
        .parse::<Role>()
        .map_err(|_| AppError::Unauthenticated("Invalid or expired token".into()))?;

    Ok(AuthUser {
        user_id: claims.user_id,
        email: claims.sub,
        name: claims.name,
        role,
        department: claims.department,
    })
}

pub fn authenticate(headers: &HeaderMap, config: &Config) -> Result<AuthUser, AppError> {
    let header_value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthenticated("Authentication required".into()))?
        .to_str()
        .map_err(|_| AppError::Unauthenticated("Authentication required".into()))?;

    let token = header_value
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthenticated("Authentication required".into()))?;

    user_from_token(token, &config.jwt_secret)
}

pub async fn auth_middleware(
    mut req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let config = req
        .app_data::<Data<Config>>()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("App config missing"))?;

    match authenticate(req.headers(), config) {
        Ok(user) => {
            req.extensions_mut().insert(user);
            next.call(req).await
        }
        Err(e) => {
            let resp = e.error_response();
            Ok(req.into_response(resp))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::generate_access_token;
    use crate::model::user::User;
    use actix_web::http::header::HeaderValue;

    fn config() -> Config {
        Config {
            database_url: "mysql://unused".into(),
            jwt_secret: "test-secret".into(),
            server_addr: "127.0.0.1:0".into(),
            access_token_ttl: 3600,
            rate_login_per_min: 5,
            rate_register_per_min: 5,
            rate_protected_per_min: 100,
            api_prefix: "/api".into(),
        }
    }

    fn sample_user() -> User {
        User {
            id: 7,
            name: "Jane Doe".into(),
            email: "jane@company.com".into(),
            password: "hash".into(),
            role: Role::Employee,
            department: "Engineering".into(),
            position: None,
            joining_date: None,
            balance_annual: 20,
            balance_sick: 10,
            balance_casual: 10,
            created_at: None,
        }
    }

    #[test]
    fn missing_header_is_unauthenticated() {
        let headers = HeaderMap::new();
        let err = authenticate(&headers, &config()).unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated(_)));
    }

    #[test]
    fn non_bearer_header_is_unauthenticated() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Basic dXNlcjpwdw=="),
        );
        let err = authenticate(&headers, &config()).unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated(_)));
    }

    #[test]
    fn bearer_token_yields_principal() {
        let config = config();
        let token = generate_access_token(&sample_user(), &config.jwt_secret, 3600);
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );

        let user = authenticate(&headers, &config).expect("authenticates");
        assert_eq!(user.user_id, 7);
        assert_eq!(user.role, Role::Employee);
        assert_eq!(user.department, "Engineering");
    }
}
