use std::collections::HashMap;
use std::io::Read;

use flate2::read::{DeflateDecoder, GzDecoder, ZlibDecoder};
use lambda_proxy::{
    Api, Compression, PathArg, ProxyEvent, ProxyState, Reply, RouteError, RouteOptions, Status,
};
use serde_json::Value;

const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

fn event(method: &str, path: &str) -> ProxyEvent {
    ProxyEvent {
        path: Some(path.to_owned()),
        http_method: Some(method.to_owned()),
        headers: HashMap::from([("Host".to_owned(), "test.apigw.com".to_owned())]),
        ..Default::default()
    }
}

fn with_query(mut event: ProxyEvent, pairs: &[(&str, &str)]) -> ProxyEvent {
    event.query_string_parameters = pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect();
    event
}

fn json_body(body: &str) -> Value {
    serde_json::from_str(body).unwrap()
}

fn api() -> Api {
    Api::with_state("test", ProxyState::with_token("YO"))
}

// ── Registration ──

#[test]
fn duplicate_route_is_rejected() {
    let mut api = api();
    api.route("/test/<user>", RouteOptions::new(), |_| {
        Ok(Reply::new(Status::Ok, "text/plain", "a"))
    })
    .unwrap();

    let err = api
        .route("/test/<user>", RouteOptions::new(), |_| {
            Ok(Reply::new(Status::Ok, "text/plain", "b"))
        })
        .unwrap_err();

    assert!(matches!(err, RouteError::DuplicateRoute { path } if path == "/test/<user>"));
    assert_eq!(api.routes().len(), 1);
}

#[test]
fn route_entry_keeps_options() {
    let mut api = api();
    api.route(
        "/test/<user>",
        RouteOptions::new()
            .methods(["GET", "POST"])
            .cors(true)
            .token(true)
            .compression(Compression::Gzip)
            .b64encode(true)
            .name("user_view"),
        |_| Ok(Reply::new(Status::Ok, "text/plain", "")),
    )
    .unwrap();

    let entry = &api.routes()[0];
    assert_eq!(entry.view_name(), "user_view");
    assert_eq!(entry.pattern().params().collect::<Vec<_>>(), ["user"]);
    assert_eq!(entry.methods(), ["GET", "POST"]);
    assert!(entry.cors() && entry.token() && entry.b64encode());
    assert_eq!(entry.compression(), Some(Compression::Gzip));
}

// ── Routing errors ──

#[test]
fn missing_path_is_400() {
    let api = api();
    let response = api.dispatch(ProxyEvent::default(), None);

    assert_eq!(response.status_code, 400);
    assert_eq!(response.headers["Content-Type"], "application/json");
    assert_eq!(
        json_body(&response.body),
        serde_json::json!({"errorMessage": "Missing route parameter"})
    );
}

#[test]
fn unknown_path_is_400() {
    let mut api = api();
    api.route("/test/<user>", RouteOptions::new(), |_| {
        Ok(Reply::new(Status::Ok, "text/plain", "x"))
    })
    .unwrap();

    let response = api.dispatch(event("GET", "/users/remotepixel"), None);

    assert_eq!(response.status_code, 400);
    assert_eq!(
        json_body(&response.body),
        serde_json::json!({"errorMessage": "No view function for: /users/remotepixel"})
    );
}

#[test]
fn wrong_method_is_400() {
    let mut api = api();
    api.route("/test/<user>", RouteOptions::new(), |_| {
        Ok(Reply::new(Status::Ok, "text/plain", "x"))
    })
    .unwrap();

    let response = api.dispatch(event("POST", "/test/remotepixel"), None);

    assert_eq!(response.status_code, 400);
    assert_eq!(
        json_body(&response.body),
        serde_json::json!({"errorMessage": "Unsupported method: POST"})
    );
}

// ── Token ──

fn token_api() -> Api {
    let mut api = api();
    api.route("/test/<user>", RouteOptions::new().token(true), |ctx| {
        assert!(ctx.query("access_token").is_none());
        Ok(Reply::new(
            Status::Ok,
            "text/plain",
            ctx.arg("user").map(ToString::to_string).unwrap_or_default(),
        ))
    })
    .unwrap();
    api
}

#[test]
fn valid_token_reaches_view_without_token_param() {
    let api = token_api();
    let response = api.dispatch(
        with_query(event("GET", "/test/remotepixel"), &[("access_token", "YO")]),
        None,
    );
    assert_eq!(response.status_code, 200);
    assert_eq!(response.body, "remotepixel");
}

#[test]
fn invalid_or_missing_token_is_500() {
    let api = token_api();

    for query in [&[("access_token", "yo")][..], &[][..]] {
        let response = api.dispatch(with_query(event("GET", "/test/remotepixel"), query), None);
        assert_eq!(response.status_code, 500);
        assert_eq!(
            json_body(&response.body),
            serde_json::json!({"message": "Invalid access token"})
        );
    }
}

#[test]
fn token_is_checked_before_method() {
    let api = token_api();
    let response = api.dispatch(event("POST", "/test/remotepixel"), None);
    assert_eq!(response.status_code, 500);
}

#[test]
fn unconfigured_token_rejects() {
    let mut api = Api::with_state("test", ProxyState::default());
    api.route("/secret", RouteOptions::new().token(true), |_| {
        Ok(Reply::new(Status::Ok, "text/plain", "x"))
    })
    .unwrap();

    let response = api.dispatch(
        with_query(event("GET", "/secret"), &[("access_token", "YO")]),
        None,
    );
    assert_eq!(response.status_code, 500);
}

// ── View invocation ──

#[test]
fn path_args_and_query_reach_view() {
    let mut api = api();
    api.route("/<string:user>/<int:num>", RouteOptions::new(), |ctx| {
        let user = ctx.arg("user").and_then(PathArg::as_str).unwrap_or("");
        let num = ctx.arg("num").and_then(PathArg::as_int).unwrap_or(0);
        let tag = ctx.query("tag").unwrap_or("none");
        Ok(Reply::new(Status::Ok, "text/plain", format!("{user}-{num}-{tag}")))
    })
    .unwrap();

    let response = api.dispatch(
        with_query(event("GET", "/remotepixel/2"), &[("tag", "x")]),
        None,
    );
    assert_eq!(response.status_code, 200);
    assert_eq!(response.body, "remotepixel-2-x");
}

#[test]
fn first_registered_match_wins() {
    let mut api = api();
    api.route("/<string:user>", RouteOptions::new(), |_| {
        Ok(Reply::new(Status::Ok, "text/plain", "string"))
    })
    .unwrap();
    api.route("/<int:num>", RouteOptions::new(), |_| {
        Ok(Reply::new(Status::Ok, "text/plain", "int"))
    })
    .unwrap();

    assert_eq!(api.dispatch(event("GET", "/42"), None).body, "string");
}

#[test]
fn post_body_is_passed_get_body_is_not() {
    let mut api = api();
    api.route("/add", RouteOptions::new().methods(["GET", "POST"]), |ctx| {
        Ok(Reply::new(
            Status::Ok,
            "text/plain",
            ctx.body.unwrap_or_else(|| "<none>".to_owned()),
        ))
    })
    .unwrap();

    let mut post = event("POST", "/add");
    post.body = Some("0.5".to_owned());
    assert_eq!(api.dispatch(post, None).body, "0.5");

    let mut get = event("GET", "/add");
    get.body = Some("ignored".to_owned());
    assert_eq!(api.dispatch(get, None).body, "<none>");
}

#[test]
fn view_sees_raw_event() {
    let mut api = api();
    api.route("/ctx/<string:user>", RouteOptions::new(), |ctx| {
        let host = ctx.event.header("host").unwrap_or("").to_owned();
        assert!(ctx.context.is_none());
        Ok(Reply::new(Status::Ok, "text/plain", host))
    })
    .unwrap();

    assert_eq!(api.dispatch(event("GET", "/ctx/bob"), None).body, "test.apigw.com");
}

#[test]
fn view_error_becomes_500() {
    let mut api = api();
    api.route("/fail", RouteOptions::new(), |_| Err("hey something went wrong".into()))
        .unwrap();

    let response = api.dispatch(event("GET", "/fail"), None);
    assert_eq!(response.status_code, 500);
    assert_eq!(response.headers["Content-Type"], "application/json");
    assert_eq!(
        json_body(&response.body),
        serde_json::json!({"errorMessage": "hey something went wrong"})
    );
}

#[test]
fn view_status_is_respected() {
    let mut api = api();
    api.route("/gone", RouteOptions::new(), |_| {
        Ok(Reply::new(Status::NotFound, "text/plain", "nope"))
    })
    .unwrap();
    api.route("/empty", RouteOptions::new(), |_| {
        Ok(Reply::new(Status::Empty, "text/plain", ""))
    })
    .unwrap();

    assert_eq!(api.dispatch(event("GET", "/gone"), None).status_code, 404);
    assert_eq!(api.dispatch(event("GET", "/empty"), None).status_code, 204);
}

// ── Response shaping ──

#[test]
fn cors_headers_on_cors_route() {
    let mut api = api();
    api.route(
        "/json",
        RouteOptions::new().methods(["GET", "POST"]).cors(true),
        |_| Reply::json(Status::Ok, &serde_json::json!({"app": "it works"})).map_err(Into::into),
    )
    .unwrap();

    let response = api.dispatch(event("GET", "/json"), None);
    assert_eq!(response.headers["Access-Control-Allow-Origin"], "*");
    assert_eq!(response.headers["Access-Control-Allow-Methods"], "GET,POST");
    assert_eq!(response.headers["Access-Control-Allow-Credentials"], "true");
    assert_eq!(json_body(&response.body)["app"], "it works");
}

#[test]
fn no_cors_headers_by_default() {
    let mut api = api();
    api.route("/", RouteOptions::new(), |_| {
        Ok(Reply::new(Status::Ok, "text/plain", "Yo"))
    })
    .unwrap();

    let response = api.dispatch(event("GET", "/"), None);
    assert!(!response.headers.contains_key("Access-Control-Allow-Origin"));
}

fn compressed_api(method: Compression) -> Api {
    let mut api = api();
    api.route("/json", RouteOptions::new().compression(method), |_| {
        Ok(Reply::new(Status::Ok, "application/json", r#"{"app":"it works"}"#))
    })
    .unwrap();
    api
}

#[test]
fn gzip_when_client_accepts_it() {
    let api = compressed_api(Compression::Gzip);
    let mut request = event("GET", "/json");
    request
        .headers
        .insert("Accept-Encoding".to_owned(), "gzip, deflate".to_owned());

    let response = api.dispatch(request, None);
    assert_eq!(response.headers["Content-Encoding"], "gzip");
    assert!(response.is_base64_encoded);

    let mut decoded = String::new();
    GzDecoder::new(response.body_bytes().unwrap().as_slice())
        .read_to_string(&mut decoded)
        .unwrap();
    assert_eq!(decoded, r#"{"app":"it works"}"#);
}

#[test]
fn zlib_when_client_accepts_it() {
    let api = compressed_api(Compression::Zlib);
    let mut request = event("GET", "/json");
    request
        .headers
        .insert("accept-encoding".to_owned(), "zlib".to_owned());

    let response = api.dispatch(request, None);
    assert_eq!(response.headers["Content-Encoding"], "zlib");

    let mut decoded = String::new();
    ZlibDecoder::new(response.body_bytes().unwrap().as_slice())
        .read_to_string(&mut decoded)
        .unwrap();
    assert_eq!(decoded, r#"{"app":"it works"}"#);
}

#[test]
fn raw_deflate_when_client_accepts_it() {
    let api = compressed_api(Compression::Deflate);
    let mut request = event("GET", "/json");
    request
        .headers
        .insert("Accept-Encoding".to_owned(), "deflate, br".to_owned());

    let response = api.dispatch(request, None);
    assert_eq!(response.headers["Content-Encoding"], "deflate");
    assert!(response.is_base64_encoded);

    let mut decoded = String::new();
    DeflateDecoder::new(response.body_bytes().unwrap().as_slice())
        .read_to_string(&mut decoded)
        .unwrap();
    assert_eq!(decoded, r#"{"app":"it works"}"#);
}

#[test]
fn no_compression_without_accept_encoding() {
    let api = compressed_api(Compression::Gzip);

    let response = api.dispatch(event("GET", "/json"), None);
    assert!(!response.headers.contains_key("Content-Encoding"));
    assert!(!response.is_base64_encoded);
    assert_eq!(response.body, r#"{"app":"it works"}"#);

    let mut request = event("GET", "/json");
    request
        .headers
        .insert("Accept-Encoding".to_owned(), "br".to_owned());
    let response = api.dispatch(request, None);
    assert!(!response.headers.contains_key("Content-Encoding"));
}

#[test]
fn binary_routes_are_base64() {
    let mut api = api();
    api.route("/b64binary", RouteOptions::new().b64encode(true), |_| {
        Ok(Reply::new(Status::Ok, "image/png", PNG_MAGIC.to_vec()))
    })
    .unwrap();
    api.route("/binary", RouteOptions::new(), |_| {
        Ok(Reply::new(Status::Ok, "image/png", PNG_MAGIC.to_vec()))
    })
    .unwrap();

    for path in ["/b64binary", "/binary"] {
        let response = api.dispatch(event("GET", path), None);
        assert!(response.is_base64_encoded, "{path}");
        assert_eq!(response.body_bytes().unwrap(), PNG_MAGIC, "{path}");
    }
}

#[test]
fn response_serializes_as_api_gateway_json() {
    let mut api = api();
    api.route("/", RouteOptions::new(), |_| {
        Ok(Reply::new(Status::Ok, "text/plain", "Yo"))
    })
    .unwrap();

    let json = serde_json::to_value(api.dispatch(event("GET", "/"), None)).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "statusCode": 200,
            "headers": {"Content-Type": "text/plain"},
            "body": "Yo"
        })
    );
}

#[test]
fn dispatch_from_raw_api_gateway_json() {
    let mut api = api();
    api.route("/test/<user>", RouteOptions::new(), |ctx| {
        Ok(Reply::new(
            Status::Ok,
            "text/plain",
            ctx.arg("user").map(ToString::to_string).unwrap_or_default(),
        ))
    })
    .unwrap();

    let raw: ProxyEvent = serde_json::from_value(serde_json::json!({
        "resource": "/{proxy+}",
        "path": "/test/remotepixel",
        "httpMethod": "GET",
        "headers": {"Host": "test.apigw.com"},
        "queryStringParameters": null,
        "pathParameters": {"proxy": "test/remotepixel"},
        "stageVariables": null,
        "requestContext": {"stage": "production"},
        "body": null,
        "isBase64Encoded": false
    }))
    .unwrap();

    let response = api.dispatch(raw, None);
    assert_eq!(response.status_code, 200);
    assert_eq!(response.body, "remotepixel");
}
