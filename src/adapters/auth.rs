//! Bearer-token extractor. Tokens are issued elsewhere; this only checks an
//! HS256 signature and pulls the numeric user id out of the claims.

use {
    crate::{AppState, domain::id::UserId},
    axum::{
        Json,
        extract::FromRequestParts,
        http::{StatusCode, header, request::Parts},
        response::{IntoResponse, Response},
    },
    jsonwebtoken::{Algorithm, DecodingKey, Validation, decode},
    serde::Deserialize,
    serde_json::{Value, json},
};

pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    pub fn verify(&self, token: &str) -> Result<UserId, AuthRejection> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|e| {
            tracing::debug!("rejected bearer token: {e}");
            AuthRejection("invalid token")
        })?;
        data.claims
            .user_id()
            .ok_or(AuthRejection("token carries no user id"))
    }
}

#[derive(Debug, Deserialize)]
struct Claims {
    #[serde(default)]
    sub: Option<Value>,
    #[serde(default)]
    user_id: Option<Value>,
}

fn numeric_id(v: &Value) -> Option<i64> {
    let id = match v {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    };
    id.filter(|id| *id > 0)
}

impl Claims {
    fn user_id(&self) -> Option<UserId> {
        self.sub
            .as_ref()
            .and_then(numeric_id)
            .or_else(|| self.user_id.as_ref().and_then(numeric_id))
            .map(UserId::new)
    }
}

#[derive(Debug)]
pub struct AuthRejection(&'static str);

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let body = json!({"error_code": "unauthorized", "message": self.0});
        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}

/// The authenticated caller.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub UserId);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthRejection("missing bearer token"))?;

        state.jwt.verify(token).map(AuthUser)
    }
}
