use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{Error, Result};
use crate::models::account::Role;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub role: Role,
    pub exp: usize,
}

/// Authenticated caller, as vouched for by the token service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub account_id: i64,
    pub email: String,
    pub role: Role,
}

#[derive(Clone)]
pub struct TokenVerifier {
    decoding: DecodingKey,
    encoding: EncodingKey,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            encoding: EncodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn verify(&self, token: &str) -> Result<Identity> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        let data = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|e| Error::Unauthenticated(format!("invalid_token: {}", e)))?;
        let account_id = data
            .claims
            .sub
            .parse::<i64>()
            .map_err(|_| Error::Unauthenticated("invalid_subject".to_string()))?;
        Ok(Identity {
            account_id,
            email: data.claims.email,
            role: data.claims.role,
        })
    }

    /// Signs a token the same way the external token service does. Used by tooling and tests.
    pub fn issue(&self, identity: &Identity, ttl: chrono::Duration) -> Result<String> {
        let exp = (chrono::Utc::now() + ttl).timestamp().max(0) as usize;
        let claims = Claims {
            sub: identity.account_id.to_string(),
            email: identity.email.clone(),
            role: identity.role,
            exp,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| Error::Internal(format!("token signing failed: {}", e)))
    }
}

fn unauthorized(code: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": code }))).into_response()
}

/// Attaches an [`Identity`] to the request when a bearer token is present.
/// Requests without credentials pass through; the role gate decides whether that is acceptable.
pub async fn resolve_identity(
    State(verifier): State<TokenVerifier>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(auth_header) = req.headers().get(axum::http::header::AUTHORIZATION) else {
        return next.run(req).await;
    };
    let Ok(auth_str) = auth_header.to_str() else {
        return unauthorized("bad_authorization");
    };
    let Some(token) = auth_str.strip_prefix("Bearer ") else {
        return unauthorized("unsupported_scheme");
    };

    match verifier.verify(token) {
        Ok(identity) => {
            req.extensions_mut().insert(identity);
            next.run(req).await
        }
        Err(err) => {
            tracing::warn!(error = %err, "rejected bearer token");
            unauthorized("invalid_token")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> Identity {
        Identity {
            account_id: 7,
            email: "ops@example.com".into(),
            role: Role::Faculty,
        }
    }

    #[test]
    fn issued_token_verifies_back_to_the_same_identity() {
        let verifier = TokenVerifier::new("secret");
        let token = verifier
            .issue(&identity(), chrono::Duration::minutes(5))
            .unwrap();
        assert_eq!(verifier.verify(&token).unwrap(), identity());
    }

    #[test]
    fn token_signed_with_another_secret_is_rejected() {
        let token = TokenVerifier::new("other")
            .issue(&identity(), chrono::Duration::minutes(5))
            .unwrap();
        let err = TokenVerifier::new("secret").verify(&token).unwrap_err();
        assert!(matches!(err, Error::Unauthenticated(_)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let verifier = TokenVerifier::new("secret");
        let token = verifier
            .issue(&identity(), chrono::Duration::hours(-2))
            .unwrap();
        assert!(matches!(
            verifier.verify(&token),
            Err(Error::Unauthenticated(_))
        ));
    }
}
