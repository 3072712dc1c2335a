//! Authentication helpers and access control.
//!
//! - [`basic_auth`] / [`bearer_auth`] read the `Authorization` header
//! - [`AccessFn`] and the combinators [`and`], [`or`], [`and_seq`], [`or_seq`]
//!   decide who may call a route
//! - [`Authenticator`] turns a request into a token; [`prepare_authed`]
//!   mounts a handler behind one
//! - with the `jwt` feature, [`valid_jwt`], [`jwt_and`] and
//!   [`prepauth_token_jwt`] handle HS256 bearer tokens

mod access;
mod header;
#[cfg(feature = "jwt")]
mod jwt;

pub use access::{
    access_fn, and, and_seq, anybody, or, or_seq, prepare_and, prepare_authed, reject_access,
    AccessFn, AuthedRequest, Authenticator, REJECT_MESSAGE,
};
pub use header::{basic_auth, bearer_auth};
#[cfg(feature = "jwt")]
pub use jwt::{decode_jwt, jwt_and, prepauth_token_jwt, sign_jwt, valid_jwt, JWT_AUTH};
