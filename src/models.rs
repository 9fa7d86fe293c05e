use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct RegisterReq {
    #[schema(example = "Jane Doe")]
    pub name: String,
    #[schema(example = "jane@company.com", format = "email")]
    pub email: String,
    #[schema(example = "s3cret")]
    pub password: String,
    #[schema(example = "employee")]
    pub role: crate::model::role::Role,
    #[schema(example = "Engineering")]
    pub department: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginReq {
    #[schema(example = "jane@company.com", format = "email")]
    pub email: String,
    #[schema(example = "s3cret")]
    pub password: String,
}

/// JWT payload. `role` and `department` travel as strings so the token stays
/// readable by the existing client; the middleware parses them back into the
/// typed principal.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    pub sub: String,
    pub name: String,
    pub role: String,
    pub department: String,
    pub exp: usize,
    pub jti: String,
}
