//! The demo API shared by the integration tests.

#![allow(dead_code)]

use apiprep::auth::prepauth_token_jwt;
use apiprep::docs::{Api, SectionDef};
use apiprep::schema::{any, array, boolean, int, obj, obj_values, one_of, string, value};
use apiprep::{
    data, http_code, http_error, prepare, HandlerError, HttpCode, HttpError, Outcome,
    PreparedRoute, RouteOptions, RouteRequest,
};
use serde_json::{json, Value};

pub const JWT_KEY: &str = "demo-key";

fn name_of(req: &RouteRequest) -> String {
    req.body["name"].as_str().unwrap_or_default().to_string()
}

pub fn my_endpoint() -> PreparedRoute {
    prepare(
        RouteOptions::new("Testendpoint for multiple purposes")
            .description("Behaves radically different, based on what\n the filter is.")
            .body(obj([("name", string().default("no name").description("A name"))]))
            .query(obj([("filter", string().optional()), ("number", int().default(0))]))
            .params(obj([("id", int().semantic("id"))]))
            .returns(vec![
                data(value("ok")),
                http_error(400, "Name too long"),
                data(obj([
                    ("foo", value("really!").description("Some text")),
                    ("boo", boolean()),
                    ("kabaz", boolean().optional()),
                    (
                        "arr",
                        array(
                            obj([
                                ("a", int()),
                                ("c", obj([("d", int())]).optional()),
                                ("e", int().optional()),
                            ])
                            .description("Some array item text"),
                        )
                        .description("This is an array"),
                    ),
                    ("objectWithUnknownKeys", obj_values(int()).description("Free keys")),
                    ("objectWithUnknownKeysAndUnknownTypes", obj_values(any())),
                ])),
            ]),
        |req: RouteRequest| async move {
            if name_of(&req).len() > 100 {
                return Ok(Outcome::from(HttpError::new(400, "Name too long")));
            }
            let Some(filter) = req.query.get("filter").and_then(Value::as_str) else {
                return Ok(Outcome::data("ok"));
            };
            let baz = if filter == "asstring" { json!("77") } else { json!(77) };
            let mut resp = json!({
                "arr": [{ "a": 1 }, { "a": 2, "c": null, "e": null }],
                "foo": "really!",
                "boo": true,
                "objectWithUnknownKeys": { "baz": baz, "boo": 99 },
                "objectWithUnknownKeysAndUnknownTypes": { "baz": 77, "boo": false },
            });
            if filter == "kabazplz" {
                resp["kabaz"] = json!(false);
            }
            Ok::<_, HandlerError>(Outcome::data(resp))
        },
    )
    .expect("well defined")
}

pub fn my_faulty_endpoint() -> PreparedRoute {
    prepare(
        RouteOptions::new("Faulty Testendpoint")
            .description("Ment to be found to be faulty. It's documentation\ndoes not match it's behavior.")
            .body(obj([("name", string().default("no name").description("A name"))]))
            .query(obj([("filter", string().optional())]))
            .params(obj([("id", int().semantic("id"))]))
            .returns(vec![
                data(value("ok")),
                http_error(400, "Name too long"),
                data(obj([("boo", boolean()), ("arr", array(obj([("a", int())])))])),
            ]),
        |req: RouteRequest| async move {
            if name_of(&req).len() > 100 {
                return Ok(Outcome::from(HttpError::new(400, "Name is too long")));
            }
            let body = match req.query.get("filter").and_then(Value::as_str) {
                Some("wrongType") => json!({ "arr": [{ "a": true }, { "a": 2 }], "boo": true }),
                Some("tooMuch") => json!({ "arr": [{ "a": 2 }, { "a": 2 }], "boo": true, "tooMuch": true }),
                Some("tooLittle") => json!({ "arr": [{ "a": 2 }, { "a": 2 }] }),
                _ => json!("whut?"),
            };
            Ok::<_, HandlerError>(Outcome::data(body))
        },
    )
    .expect("well defined")
}

pub fn my_typeless_endpoint() -> PreparedRoute {
    prepare(
        RouteOptions::new("Typeless endpoint")
            .description("This endpoint is typeless but not pointless."),
        |_req: RouteRequest| async { Ok::<_, HandlerError>(Outcome::data("ok")) },
    )
    .expect("well defined")
}

pub fn my_one_of_endpoint() -> PreparedRoute {
    prepare(
        RouteOptions::new("OneOf endpoint")
            .description("This endpoint can't decide what it wants.")
            .body(obj([(
                "value",
                one_of(vec![
                    int().description("One option"),
                    obj_values(any()).description("Another option"),
                ]),
            )]))
            .returns(vec![data(value("ok").title("ok"))]),
        |_req: RouteRequest| async { Ok::<_, HandlerError>(Outcome::data("ok")) },
    )
    .expect("well defined")
}

pub fn my_jwt_endpoint() -> PreparedRoute {
    prepauth_token_jwt(
        JWT_KEY,
        RouteOptions::new("Endpoint with JWT Authentication")
            .description("You shall not pass, unless you have a JWT.")
            .returns(vec![data(value("ok"))]),
        |_req: RouteRequest, _claims: Value| async { Ok::<_, HandlerError>(Outcome::data("ok")) },
    )
    .expect("well defined")
}

pub fn my_error_checkpoint() -> PreparedRoute {
    prepare(
        RouteOptions::new("Error checkpoint endpoint")
            .description("This endpoint is full of errors.")
            .query(obj([("error", boolean())]))
            .returns(vec![
                http_error(400, "Text 1"),
                http_code(400, obj([("error", value("Text 1")), ("unknownField", string())])),
            ]),
        |req: RouteRequest| async move {
            if req.query["error"] == json!(true) {
                Ok::<_, HandlerError>(Outcome::from(
                    HttpError::new(400, "Text 1").with_description("Text 2"),
                ))
            } else {
                Ok(Outcome::from(HttpCode::new(
                    400,
                    json!({ "error": "Text 1", "unknownField": "Some unknown text" }),
                )))
            }
        },
    )
    .expect("well defined")
}

pub fn my_defaults_endpoint() -> PreparedRoute {
    prepare(
        RouteOptions::new("Endpoint with defaults in nested keys")
            .description("This endpoint is full of defaults.")
            .body(obj([(
                "deep",
                obj([
                    ("hasDefault", string().default("the default")),
                    ("doesNotHaveDefault", string()),
                ]),
            )]))
            .returns(vec![data(value("ok"))]),
        |req: RouteRequest| async move {
            let deep = &req.body["deep"];
            if deep["hasDefault"] == json!("the default") {
                Ok::<_, HandlerError>(Outcome::data("ok"))
            } else {
                Ok(Outcome::data(deep.clone()))
            }
        },
    )
    .expect("well defined")
}

pub const INTRODUCTION: &str = "This API is for demo and testing purposes. You should never use it.";

/// Introduction / Some test endpoints { Undecided, Auth } / unsectioned error route.
pub fn demo_api() -> Api {
    let mut api = Api::new();
    api.section(SectionDef::new("Introduction").description(INTRODUCTION), |_| {});
    api.section(SectionDef::new("Some test endpoints"), |api| {
        api.post("/v/1/endpoint/:id", my_endpoint());
        api.post("/v/1/faultyendpoint/:id", my_faulty_endpoint());
        api.post("/v/1/typelessendpoint", my_typeless_endpoint());
        api.section(
            SectionDef::new("Undecided").description("### Testing the *description*"),
            |api| {
                api.post("/v/1/cantdecide", my_one_of_endpoint());
            },
        );
        api.section(SectionDef::new("Auth"), |api| {
            api.put("/v/1/withjwt", my_jwt_endpoint());
        });
    });
    api.get("/v/1/error", my_error_checkpoint());
    api.post("/v/1/defaults", my_defaults_endpoint());
    api
}
