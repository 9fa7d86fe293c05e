use std::time::{SystemTime, UNIX_EPOCH};

use crate::model::user::User;
use crate::models::Claims;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

fn now() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize
}

pub fn generate_access_token(user: &User, secret: &str, ttl: usize) -> String {
    let claims = Claims {
        user_id: user.id,
        sub: user.email.clone(),
        name: user.name.clone(),
        role: user.role.to_string(),
        department: user.department.clone(),
        exp: now() + ttl,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::role::Role;

    fn sample_user() -> User {
        User {
            id: 42,
            name: "Jane Doe".into(),
            email: "jane@company.com".into(),
            password: "hash".into(),
            role: Role::Manager,
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
    fn token_round_trips_the_principal() {
        let token = generate_access_token(&sample_user(), "secret", 3600);
        let claims = verify_token(&token, "secret").expect("token verifies");
        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.sub, "jane@company.com");
        assert_eq!(claims.role, "manager");
        assert_eq!(claims.department, "Engineering");
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = generate_access_token(&sample_user(), "secret", 3600);
        assert!(verify_token(&token, "other-secret").is_err());
    }

    #[test]
    fn tampered_token_is_rejected() {
        let token = generate_access_token(&sample_user(), "secret", 3600);
        let mut tampered = token.clone();
        tampered.push('x');
        assert!(verify_token(&tampered, "secret").is_err());
    }
}
