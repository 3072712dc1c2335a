//! JSON Web Token authentication.
//!
//! Tokens are HS256-signed with a shared key. Expiry is enforced when the
//! token carries an `exp` claim; no claim is required.

use std::future::Future;

use futures::FutureExt;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::access::{prepare_and, AccessFn, AuthedRequest, Authenticator};
use super::header::bearer_auth;
use crate::error::DefinitionError;
use crate::prepare::{prepare, PreparedRoute, RouteOptions, RouteRequest};
use crate::reply::{http_error, HandlerError, HandlerResult, HttpError};

pub const JWT_AUTH: &str = "Bearer jwt";

fn validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.required_spec_claims.clear();
    validation
}

/// Verifies `token` and decodes its claims.
pub fn decode_jwt<T: DeserializeOwned>(token: &str, key: &str) -> eyre::Result<T> {
    let data = decode::<T>(token, &DecodingKey::from_secret(key.as_bytes()), &validation())?;
    Ok(data.claims)
}

/// Signs `claims` with HS256.
pub fn sign_jwt<T: Serialize>(claims: &T, key: &str) -> eyre::Result<String> {
    let header = Header {
        alg: Algorithm::HS256,
        ..Default::default()
    };
    let token = encode(&header, claims, &EncodingKey::from_secret(key.as_bytes()))?;
    Ok(token)
}

/// Accepts requests with a valid bearer token and yields its claims.
///
/// Missing, malformed and badly signed tokens are answered with
/// 401 `Unauthorized`.
pub fn valid_jwt<T>(key: &str) -> Authenticator<T>
where
    T: DeserializeOwned + Send + 'static,
{
    let key = key.to_string();
    Authenticator::new(
        JWT_AUTH,
        vec![http_error(401, "Unauthorized")],
        move |req: &RouteRequest| {
            let claims = bearer_auth(req)
                .ok_or_else(|| HttpError::from_code(401))
                .and_then(|token| {
                    decode_jwt::<T>(token, &key).map_err(|e| {
                        tracing::debug!(error = %e, "rejected bearer token");
                        HttpError::from_code(401)
                    })
                })
                .map_err(HandlerError::from);
            async move { claims }.boxed()
        },
    )
}

/// [`valid_jwt`] followed by access functions that see the claims.
pub fn jwt_and<T>(key: &str) -> impl Fn(Vec<AccessFn<AuthedRequest<T>>>) -> Authenticator<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    prepare_and(valid_jwt(key))
}

/// Prepares a route for logged-in users.
///
/// The bearer token must be valid and carry `"action": "login"`. The handler
/// receives the decoded claims. Adds 401 `Unauthorized` and 401
/// `Token invalid` to the documented returns.
pub fn prepauth_token_jwt<T, F, Fut>(
    key: &str,
    mut options: RouteOptions,
    handler: F,
) -> Result<PreparedRoute, DefinitionError>
where
    T: DeserializeOwned + Send + 'static,
    F: Fn(RouteRequest, T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    options.auth = Some(JWT_AUTH.to_string());
    options.returns.push(http_error(401, "Unauthorized"));
    options.returns.push(http_error(401, "Token invalid"));

    let key = key.to_string();
    let handler = std::sync::Arc::new(handler);
    prepare(options, move |req: RouteRequest| {
        let handler = handler.clone();
        let claims = login_claims::<T>(&req, &key);
        async move {
            match claims {
                Ok(claims) => handler(req, claims).await,
                Err(e) => Ok(e.into()),
            }
        }
    })
}

fn login_claims<T: DeserializeOwned>(req: &RouteRequest, key: &str) -> Result<T, HttpError> {
    let token = bearer_auth(req).ok_or_else(|| HttpError::new(401, "Unauthorized"))?;
    let claims: Value = decode_jwt(token, key).map_err(|_| HttpError::new(401, "Token invalid"))?;
    if claims.get("action").and_then(Value::as_str) != Some("login") {
        return Err(HttpError::new(401, "Unauthorized"));
    }
    serde_json::from_value(claims).map_err(|_| HttpError::new(401, "Token invalid"))
}
