use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, request::Parts},
};
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

/// JWT verification settings shared by every authenticated router.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub admin_roles: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppMetadata {
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SupabaseClaims {
    pub sub: String,
    pub role: String,
    pub email: Option<String>,
    pub exp: usize,
    #[serde(default)]
    pub app_metadata: AppMetadata,
}

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub role: String,
    pub app_role: Option<String>,
}

/// An authenticated user whose `app_metadata.role` is one of the configured admin roles.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

#[derive(Debug)]
pub struct AuthError(anyhow::Error);

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        AuthError(err)
    }
}

impl axum::response::IntoResponse for AuthError {
    fn into_response(self) -> axum::response::Response {
        (
            StatusCode::UNAUTHORIZED,
            format!("Unauthorized: {}", self.0),
        )
            .into_response()
    }
}

pub fn validate_supabase_jwt(token: &str, secret: &str) -> Result<SupabaseClaims, AuthError> {
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
    validation.set_audience(&["authenticated", "service_role"]);

    let token_data = decode::<SupabaseClaims>(token, &decoding_key, &validation)
        .map_err(|e| anyhow::anyhow!("JWT validation failed: {}", e))?;

    Ok(token_data.claims)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    Arc<AuthConfig>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_config = Arc::<AuthConfig>::from_ref(state);

        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .ok_or((
                StatusCode::UNAUTHORIZED,
                "Missing Authorization header".to_string(),
            ))?;

        let auth_str = auth_header.to_str().map_err(|_| {
            (
                StatusCode::UNAUTHORIZED,
                "Invalid Authorization header".to_string(),
            )
        })?;

        let token = auth_str.strip_prefix("Bearer ").ok_or((
            StatusCode::UNAUTHORIZED,
            "Invalid Authorization header format".to_string(),
        ))?;

        let claims = validate_supabase_jwt(token, &auth_config.jwt_secret)
            .map_err(|e| (StatusCode::UNAUTHORIZED, e.0.to_string()))?;

        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| {
            (
                StatusCode::UNAUTHORIZED,
                "Invalid user ID in token".to_string(),
            )
        })?;

        Ok(AuthUser {
            user_id,
            email: claims.email,
            role: claims.role,
            app_role: claims.app_metadata.role,
        })
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    Arc<AuthConfig>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        let auth_config = Arc::<AuthConfig>::from_ref(state);

        let is_admin = user.app_role.as_deref().is_some_and(|role| {
            auth_config
                .admin_roles
                .iter()
                .any(|admin_role| admin_role.eq_ignore_ascii_case(role))
        });

        if !is_admin {
            warn!(user_id = %user.user_id, "auth: non-admin user hit an admin route");
            return Err((StatusCode::FORBIDDEN, "Admin role required".to_string()));
        }

        Ok(AdminUser(user))
    }
}

#[cfg(test)]
pub(crate) fn issue_test_token(secret: &str, user_id: Uuid, app_role: Option<&str>) -> String {
    use jsonwebtoken::{EncodingKey, Header, encode};

    #[derive(Serialize)]
    struct TestClaims<'a> {
        sub: String,
        role: &'a str,
        aud: &'a str,
        email: Option<&'a str>,
        exp: usize,
        app_metadata: AppMetadata,
    }

    encode(
        &Header::default(),
        &TestClaims {
            sub: user_id.to_string(),
            role: "authenticated",
            aud: "authenticated",
            email: Some("test@example.com"),
            exp: 9_999_999_999,
            app_metadata: AppMetadata {
                role: app_role.map(str::to_string),
            },
        },
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}
