//! Access functions and their combinators.
//!
//! An [`AccessFn`] is an async check over some context (usually the request)
//! that either lets the request through or fails with an [`HttpError`]. Each
//! one carries a human readable description and the error responses it may
//! produce, so combining checks also combines their documentation.
//!
//! ```rust
//! use apiprep::auth::{access_fn, and, or, reject_access};
//! use apiprep::{http_error, HandlerError, HttpError, RouteRequest};
//! use futures::FutureExt;
//!
//! let is_admin = access_fn(
//!     "is admin",
//!     vec![http_error(403, "Not an admin")],
//!     |req: &RouteRequest| {
//!         let admin = req.header("x-role") == Some("admin");
//!         async move {
//!             if admin {
//!                 Ok(())
//!             } else {
//!                 Err(HandlerError::from(HttpError::new(403, "Not an admin")))
//!             }
//!         }
//!         .boxed()
//!     },
//! );
//! let check = or(vec![is_admin, reject_access()]);
//! assert_eq!(check.description(), "(is admin or nobody)");
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{select_ok, try_join_all, BoxFuture};
use indexmap::IndexMap;

use crate::error::DefinitionError;
use crate::prepare::{prepare, PreparedRoute, RouteOptions, RouteRequest};
use crate::reply::{http_error, HandlerError, HandlerResult, HttpError, ReturnSchema};
use crate::schema::Describe;

pub const REJECT_MESSAGE: &str = "You don't have the rights to retrieve this.";

type CheckFn<C> =
    dyn for<'a> Fn(&'a C) -> BoxFuture<'a, Result<(), HandlerError>> + Send + Sync;

/// An async access check over a context `C`.
pub struct AccessFn<C> {
    check: Arc<CheckFn<C>>,
    description: String,
    returns: Vec<ReturnSchema>,
}

impl<C> Clone for AccessFn<C> {
    fn clone(&self) -> Self {
        Self {
            check: self.check.clone(),
            description: self.description.clone(),
            returns: self.returns.clone(),
        }
    }
}

impl<C> fmt::Debug for AccessFn<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessFn")
            .field("description", &self.description)
            .field("returns", &self.returns)
            .finish_non_exhaustive()
    }
}

impl<C> AccessFn<C> {
    pub async fn check(&self, context: &C) -> Result<(), HandlerError> {
        (self.check)(context).await
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn returns(&self) -> &[ReturnSchema] {
        &self.returns
    }
}

/// Builds an access function from a closure.
pub fn access_fn<C, F>(
    description: impl Into<String>,
    returns: Vec<ReturnSchema>,
    check: F,
) -> AccessFn<C>
where
    F: for<'a> Fn(&'a C) -> BoxFuture<'a, Result<(), HandlerError>> + Send + Sync + 'static,
{
    AccessFn {
        check: Arc::new(check),
        description: description.into(),
        returns,
    }
}

/// Lets everybody through.
pub fn anybody<C: 'static>() -> AccessFn<C> {
    access_fn("anybody", Vec::new(), |_: &C| {
        Box::pin(async { Ok::<(), HandlerError>(()) })
    })
}

/// Lets nobody through, answering 403.
pub fn reject_access<C: 'static>() -> AccessFn<C> {
    access_fn(
        "nobody",
        vec![http_error(403, REJECT_MESSAGE)],
        |_: &C| Box::pin(async { Err(HandlerError::from(HttpError::new(403, REJECT_MESSAGE))) }),
    )
}

/// Returns `returns` without duplicates, keeping first occurrences.
pub(crate) fn unique(returns: impl IntoIterator<Item = ReturnSchema>) -> Vec<ReturnSchema> {
    let mut seen: IndexMap<String, ReturnSchema> = IndexMap::new();
    for ret in returns {
        seen.entry(ret.to_descriptor().to_string()).or_insert(ret);
    }
    seen.into_values().collect()
}

fn join<C>(fns: &[AccessFn<C>], word: &str) -> (String, Vec<ReturnSchema>) {
    let description = fns
        .iter()
        .map(|f| f.description.as_str())
        .collect::<Vec<_>>()
        .join(&format!(" {} ", word));
    let returns = unique(fns.iter().flat_map(|f| f.returns.iter().cloned()));
    (format!("({})", description), returns)
}

fn checks<C>(fns: &[AccessFn<C>]) -> Arc<Vec<Arc<CheckFn<C>>>> {
    Arc::new(fns.iter().map(|f| f.check.clone()).collect())
}

/// Passes if every function passes. All checks run concurrently.
pub fn and<C: Sync + 'static>(fns: Vec<AccessFn<C>>) -> AccessFn<C> {
    let (description, returns) = join(&fns, "and");
    let checks = checks(&fns);
    access_fn(description, returns, move |ctx: &C| {
        let pending: Vec<_> = checks.iter().map(|check| check(ctx)).collect();
        Box::pin(async move { try_join_all(pending).await.map(|_| ()) })
    })
}

/// Passes if any function passes. All checks run concurrently; if all fail,
/// the error of the last one to fail is returned.
pub fn or<C: Sync + 'static>(fns: Vec<AccessFn<C>>) -> AccessFn<C> {
    let (description, mut returns) = join(&fns, "or");
    if fns.is_empty() {
        returns.push(http_error(403, REJECT_MESSAGE));
    }
    let checks = checks(&fns);
    access_fn(description, returns, move |ctx: &C| {
        let pending: Vec<_> = checks.iter().map(|check| check(ctx)).collect();
        Box::pin(async move {
            if pending.is_empty() {
                return Err(HandlerError::from(HttpError::new(403, REJECT_MESSAGE)));
            }
            select_ok(pending).await.map(|_| ())
        })
    })
}

/// Passes if every function passes, checking one after the other and
/// stopping at the first failure.
pub fn and_seq<C: Sync + 'static>(fns: Vec<AccessFn<C>>) -> AccessFn<C> {
    let (description, returns) = join(&fns, "and");
    let checks = checks(&fns);
    access_fn(description, returns, move |ctx: &C| {
        let checks = checks.clone();
        Box::pin(async move {
            for check in checks.iter() {
                check(ctx).await?;
            }
            Ok::<(), HandlerError>(())
        })
    })
}

/// Passes if any function passes, checking one after the other and stopping
/// at the first success. If all fail, the last error is returned.
pub fn or_seq<C: Sync + 'static>(fns: Vec<AccessFn<C>>) -> AccessFn<C> {
    let (description, mut returns) = join(&fns, "or");
    if fns.is_empty() {
        returns.push(http_error(403, REJECT_MESSAGE));
    }
    let checks = checks(&fns);
    access_fn(description, returns, move |ctx: &C| {
        let checks = checks.clone();
        Box::pin(async move {
            let mut last = HandlerError::from(HttpError::new(403, REJECT_MESSAGE));
            for check in checks.iter() {
                match check(ctx).await {
                    Ok(()) => return Ok(()),
                    Err(e) => last = e,
                }
            }
            Err(last)
        })
    })
}

type AuthenticateFn<T> =
    dyn for<'a> Fn(&'a RouteRequest) -> BoxFuture<'a, Result<T, HandlerError>> + Send + Sync;

/// Turns a request into a token (claims, a user, ...) or rejects it.
pub struct Authenticator<T> {
    authenticate: Arc<AuthenticateFn<T>>,
    description: String,
    returns: Vec<ReturnSchema>,
}

impl<T> Clone for Authenticator<T> {
    fn clone(&self) -> Self {
        Self {
            authenticate: self.authenticate.clone(),
            description: self.description.clone(),
            returns: self.returns.clone(),
        }
    }
}

impl<T> fmt::Debug for Authenticator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authenticator")
            .field("description", &self.description)
            .field("returns", &self.returns)
            .finish_non_exhaustive()
    }
}

impl<T> Authenticator<T> {
    pub fn new<F>(description: impl Into<String>, returns: Vec<ReturnSchema>, authenticate: F) -> Self
    where
        F: for<'a> Fn(&'a RouteRequest) -> BoxFuture<'a, Result<T, HandlerError>>
            + Send
            + Sync
            + 'static,
    {
        Self {
            authenticate: Arc::new(authenticate),
            description: description.into(),
            returns,
        }
    }

    pub async fn authenticate(&self, request: &RouteRequest) -> Result<T, HandlerError> {
        (self.authenticate)(request).await
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn returns(&self) -> &[ReturnSchema] {
        &self.returns
    }
}

impl From<AccessFn<RouteRequest>> for Authenticator<()> {
    fn from(access: AccessFn<RouteRequest>) -> Self {
        let check = access.check;
        Authenticator::new(access.description, access.returns, move |req: &RouteRequest| {
            check(req)
        })
    }
}

/// A request together with the token its authenticator produced.
#[derive(Debug, Clone)]
pub struct AuthedRequest<T> {
    pub request: RouteRequest,
    pub token: T,
}

/// Combines an authenticator with access functions that see its token.
///
/// The returned closure takes the access functions; all of them must pass
/// (see [`and`]) for the token to be handed on.
pub fn prepare_and<T>(
    authenticator: Authenticator<T>,
) -> impl Fn(Vec<AccessFn<AuthedRequest<T>>>) -> Authenticator<T>
where
    T: Send + Sync + 'static,
{
    move |fns: Vec<AccessFn<AuthedRequest<T>>>| {
        let description = std::iter::once(authenticator.description.as_str())
            .chain(fns.iter().map(|f| f.description.as_str()))
            .collect::<Vec<_>>()
            .join(" and ");
        let returns = unique(
            authenticator
                .returns
                .iter()
                .cloned()
                .chain(fns.iter().flat_map(|f| f.returns.iter().cloned())),
        );
        let access = and(fns);
        let inner = authenticator.clone();
        Authenticator::new(description, returns, move |req: &RouteRequest| {
            let inner = inner.clone();
            let access = access.clone();
            Box::pin(async move {
                let token = inner.authenticate(req).await?;
                let authed = AuthedRequest {
                    request: req.clone(),
                    token,
                };
                access.check(&authed).await?;
                Ok::<T, HandlerError>(authed.token)
            })
        })
    }
}

/// Prepares a route whose handler only runs once `authenticator` accepted
/// the request, and receives the token it produced.
///
/// The authenticator's description becomes the route's `auth` label unless
/// one is set, and its returns are added to the route's.
pub fn prepare_authed<T, F, Fut>(
    mut options: RouteOptions,
    authenticator: Authenticator<T>,
    handler: F,
) -> Result<PreparedRoute, DefinitionError>
where
    T: Send + 'static,
    F: Fn(RouteRequest, T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    if options.auth.is_none() {
        options.auth = Some(authenticator.description.clone());
    }
    options.returns = unique(options.returns.into_iter().chain(authenticator.returns.iter().cloned()));

    let authenticator = Arc::new(authenticator);
    let handler = Arc::new(handler);
    prepare(options, move |req: RouteRequest| {
        let authenticator = authenticator.clone();
        let handler = handler.clone();
        async move {
            let token = authenticator.authenticate(&req).await?;
            handler(req, token).await
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;
    use futures::FutureExt;
    use parking_lot::Mutex;
    use std::time::Duration;

    fn run<F: Future>(f: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap()
            .block_on(f)
    }

    fn pass(name: &str) -> AccessFn<u32> {
        access_fn(name, vec![http_error(401, name)], |_: &u32| async { Ok(()) }.boxed())
    }

    fn fail(name: &str, code: u16) -> AccessFn<u32> {
        let name = name.to_string();
        access_fn(name.clone(), vec![http_error(code, name.clone())], move |_: &u32| {
            let name = name.clone();
            async move { Err(HandlerError::from(HttpError::new(code, name))) }.boxed()
        })
    }

    fn code_of(result: Result<(), HandlerError>) -> Option<u16> {
        match result {
            Ok(()) => None,
            Err(HandlerError::Http(e)) => Some(e.code),
            Err(HandlerError::Internal(_)) => Some(500),
        }
    }

    #[test]
    fn test_and_requires_all() {
        assert_eq!(code_of(run(and(vec![pass("a"), pass("b")]).check(&0))), None);
        assert_eq!(code_of(run(and(vec![pass("a"), fail("b", 403)]).check(&0))), Some(403));
        assert_eq!(code_of(run(and(Vec::new()).check(&0))), None);
    }

    #[test]
    fn test_or_requires_one() {
        assert_eq!(code_of(run(or(vec![fail("a", 401), pass("b")]).check(&0))), None);
        assert!(code_of(run(or(vec![fail("a", 401), fail("b", 403)]).check(&0))).is_some());
    }

    #[test]
    fn test_empty_or_rejects() {
        let check = or::<u32>(Vec::new());
        assert_eq!(code_of(run(check.check(&0))), Some(403));
        assert_eq!(check.returns().len(), 1);
        assert_eq!(code_of(run(or_seq::<u32>(Vec::new()).check(&0))), Some(403));
    }

    #[test]
    fn test_or_returns_last_failure() {
        let slow = access_fn("slow", Vec::new(), |_: &u32| {
            async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                Err(HandlerError::from(HttpError::new(418, "slow")))
            }
            .boxed()
        });
        let check = or(vec![slow, fail("fast", 401)]);
        assert_eq!(code_of(run(check.check(&0))), Some(418));
    }

    #[test]
    fn test_sequential_order_and_short_circuit() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let tracked = |name: &'static str, ok: bool| {
            let calls = calls.clone();
            access_fn(name, Vec::new(), move |_: &u32| {
                calls.lock().push(name);
                async move {
                    if ok {
                        Ok(())
                    } else {
                        Err(HandlerError::from(HttpError::from_code(403)))
                    }
                }
                .boxed()
            })
        };

        run(and_seq(vec![tracked("a", true), tracked("b", false), tracked("c", true)]).check(&0)).unwrap_err();
        assert_eq!(*calls.lock(), vec!["a", "b"]);

        calls.lock().clear();
        run(or_seq(vec![tracked("a", false), tracked("b", true), tracked("c", true)]).check(&0)).unwrap();
        assert_eq!(*calls.lock(), vec!["a", "b"]);

        calls.lock().clear();
        let result = run(or_seq(vec![tracked("a", false), tracked("b", false)]).check(&0));
        assert_eq!(code_of(result), Some(403));
        assert_eq!(*calls.lock(), vec!["a", "b"]);
    }

    #[test]
    fn test_or_seq_reports_last_failure_in_order() {
        let check = or_seq(vec![fail("first", 401), fail("second", 418)]);
        assert_eq!(code_of(run(check.check(&0))), Some(418));

        let check = or_seq(vec![fail("first", 418), fail("second", 401)]);
        assert_eq!(code_of(run(check.check(&0))), Some(401));
    }

    #[test]
    fn test_descriptions_nest() {
        let check = or(vec![and(vec![pass("a"), pass("b")]), and_seq(vec![pass("c")])]);
        assert_eq!(check.description(), "((a and b) or (c))");
    }

    #[test]
    fn test_returns_are_deduplicated() {
        let check = and(vec![pass("a"), pass("a"), fail("x", 403), reject_access()]);
        let labels: Vec<_> = check.returns().iter().map(ReturnSchema::label).collect();
        assert_eq!(
            labels,
            vec![
                "HttpError(401, \"a\")",
                "HttpError(403, \"x\")",
                "HttpError(403, \"You don't have the rights to retrieve this.\")",
            ]
        );
    }

    #[test]
    fn test_prepare_and_passes_token_to_access_fns() {
        let auth: Authenticator<u32> = Authenticator::new(
            "user id header",
            vec![http_error(401, "Unauthorized")],
            |req: &RouteRequest| {
                let id = req.header("x-user").and_then(|v| v.parse().ok());
                async move { id.ok_or_else(|| HandlerError::from(HttpError::from_code(401))) }.boxed()
            },
        );
        let only_admin = access_fn(
            "is admin",
            vec![http_error(403, "Forbidden")],
            |authed: &AuthedRequest<u32>| {
                let ok = authed.token == 1;
                async move {
                    if ok {
                        Ok(())
                    } else {
                        Err(HandlerError::from(HttpError::from_code(403)))
                    }
                }
                .boxed()
            },
        );

        let combined = prepare_and(auth)(vec![only_admin]);
        assert_eq!(combined.description(), "user id header and is admin");
        assert_eq!(combined.returns().len(), 2);

        let req = |id: &str| RouteRequest::new(Method::GET, "/").with_header(
            axum::http::HeaderName::from_static("x-user"),
            id,
        );
        assert_eq!(run(combined.authenticate(&req("1"))).unwrap(), 1);
        assert!(matches!(
            run(combined.authenticate(&req("2"))),
            Err(HandlerError::Http(HttpError { code: 403, .. }))
        ));
        assert!(matches!(
            run(combined.authenticate(&req("x"))),
            Err(HandlerError::Http(HttpError { code: 401, .. }))
        ));
    }

    #[test]
    fn test_reject_access() {
        let result = run(reject_access::<u32>().check(&0));
        match result {
            Err(HandlerError::Http(e)) => {
                assert_eq!(e.code, 403);
                assert_eq!(e.message, REJECT_MESSAGE);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(run(anybody::<u32>().check(&0)).is_ok());
    }
}
