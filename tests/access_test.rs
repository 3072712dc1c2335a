//! Authenticated routes built from authenticators and access functions.

use apiprep::auth::{
    access_fn, and_seq, anybody, basic_auth, jwt_and, or_seq, prepare_and, prepare_authed, sign_jwt,
    reject_access, AccessFn, AuthedRequest, Authenticator, REJECT_MESSAGE,
};
use apiprep::docs::{Api, ApiDocOptions};
use apiprep::schema::{int, obj};
use apiprep::{http_error, HandlerError, HttpError, Outcome, RouteOptions, RouteRequest};
use axum::http::{header, Method, StatusCode};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use futures::FutureExt;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Clone)]
struct User {
    name: String,
    admin: bool,
}

fn password_auth() -> Authenticator<User> {
    Authenticator::new(
        "Basic",
        vec![http_error(401, "Unauthorized")],
        |req: &RouteRequest| {
            let user = match basic_auth(req) {
                Some((name, password)) if password == "s3cr3t" => Ok(User {
                    admin: name == "root",
                    name,
                }),
                _ => Err(HandlerError::from(HttpError::from_code(401))),
            };
            async move { user }.boxed()
        },
    )
}

fn is_admin() -> AccessFn<AuthedRequest<User>> {
    access_fn(
        "is admin",
        vec![http_error(403, "Not an admin")],
        |req: &AuthedRequest<User>| {
            let admin = req.token.admin;
            async move {
                if admin {
                    Ok(())
                } else {
                    Err(HandlerError::from(HttpError::new(403, "Not an admin")))
                }
            }
            .boxed()
        },
    )
}

fn basic(user: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", user, password)))
}

fn admin_route() -> apiprep::PreparedRoute {
    let auth = prepare_and(password_auth());
    prepare_authed(
        RouteOptions::new("Admin area"),
        auth(vec![is_admin()]),
        |_req: RouteRequest, user: User| async move {
            Ok::<_, HandlerError>(Outcome::data(json!({ "hello": user.name })))
        },
    )
    .unwrap()
}

#[tokio::test]
async fn test_authenticated_and_authorized() {
    let route = admin_route();
    let request = RouteRequest::new(Method::GET, "/admin")
        .with_header(header::AUTHORIZATION, &basic("root", "s3cr3t"));
    let reply = route.handle(request).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json_body(), Some(json!({ "hello": "root" })));
}

#[tokio::test]
async fn test_authenticated_but_not_authorized() {
    let route = admin_route();
    let request = RouteRequest::new(Method::GET, "/admin")
        .with_header(header::AUTHORIZATION, &basic("guest", "s3cr3t"));
    let reply = route.handle(request).await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);
    assert_eq!(reply.json_body(), Some(json!({ "error": "Not an admin" })));
}

#[tokio::test]
async fn test_not_authenticated() {
    let route = admin_route();
    let request = RouteRequest::new(Method::GET, "/admin")
        .with_header(header::AUTHORIZATION, &basic("root", "wrong"));
    let reply = route.handle(request).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.json_body(), Some(json!({ "error": "Unauthorized" })));
}

#[test]
fn test_documentation_of_authed_route() {
    let mut api = Api::new();
    api.get("/admin", admin_route());
    let doc = api.get_api(&ApiDocOptions::default());
    let route = &doc.routes[0];
    assert_eq!(route.options.auth.as_deref(), Some("Basic and is admin"));
    let statuses: Vec<u64> = route
        .returns
        .iter()
        .map(|r| r["status"].as_u64().unwrap())
        .collect();
    assert_eq!(statuses, vec![401, 403, 400]);
}

#[tokio::test]
async fn test_access_fn_as_authenticator() {
    let only_get = access_fn(
        "only GET",
        vec![http_error(405, "Method Not Allowed")],
        |req: &RouteRequest| {
            let get = req.method == Method::GET;
            async move {
                if get {
                    Ok(())
                } else {
                    Err(HandlerError::from(HttpError::new(405, "Method Not Allowed")))
                }
            }
            .boxed()
        },
    );
    let route = prepare_authed(
        RouteOptions::new("Read only"),
        Authenticator::from(or_seq(vec![only_get, reject_access()])),
        |_req: RouteRequest, ()| async { Ok::<_, HandlerError>(Outcome::data("read")) },
    )
    .unwrap();
    assert_eq!(route.auth(), Some("(only GET or nobody)"));

    let reply = route.handle(RouteRequest::new(Method::GET, "/")).await;
    assert_eq!(reply.json_body(), Some(json!("read")));

    let reply = route.handle(RouteRequest::new(Method::POST, "/")).await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);
    assert_eq!(reply.json_body(), Some(json!({ "error": REJECT_MESSAGE })));
}

#[derive(Debug, Clone, Deserialize)]
struct Claims {
    id: u32,
}

#[tokio::test]
async fn test_jwt_and_access_fns_see_claims() {
    const KEY: &str = "access-test";
    let owner_only = access_fn(
        "is owner",
        vec![http_error(403, "Not the owner")],
        |req: &AuthedRequest<Claims>| {
            let owner = req.request.params.get("id").and_then(|v| v.as_u64())
                == Some(u64::from(req.token.id));
            async move {
                if owner {
                    Ok(())
                } else {
                    Err(HandlerError::from(HttpError::new(403, "Not the owner")))
                }
            }
            .boxed()
        },
    );
    let auth = jwt_and::<Claims>(KEY)(vec![and_seq(vec![anybody(), owner_only])]);
    assert_eq!(auth.description(), "Bearer jwt and (anybody and is owner)");

    let route = prepare_authed(
        RouteOptions::new("Own profile").params(obj([("id", int())])),
        auth,
        |_req: RouteRequest, claims: Claims| async move {
            Ok::<_, HandlerError>(Outcome::data(claims.id))
        },
    )
    .unwrap();

    let token = sign_jwt(&json!({ "id": 5 }), KEY).unwrap();
    let request = |id: u64| {
        RouteRequest::new(Method::GET, "/profile")
            .with_param("id", id.to_string())
            .with_header(header::AUTHORIZATION, &format!("Bearer {}", token))
    };

    let reply = route.handle(request(5)).await;
    assert_eq!(reply.json_body(), Some(json!(5)));

    let reply = route.handle(request(6)).await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);
    assert_eq!(reply.json_body(), Some(json!({ "error": "Not the owner" })));
}
