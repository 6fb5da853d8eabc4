#![cfg(feature = "local")]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use lambda_proxy::{Api, ProxyState, Reply, RouteOptions, Status};
use tower::ServiceExt;

const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

fn build_app() -> axum::Router {
    let mut api = Api::with_state("local", ProxyState::with_token("YO"));
    api.route(
        "/<string:user>/<int:num>",
        RouteOptions::new().cors(true),
        |ctx| {
            let user = ctx.arg("user").map(ToString::to_string).unwrap_or_default();
            let num = ctx.arg("num").map(ToString::to_string).unwrap_or_default();
            Ok(Reply::new(Status::Ok, "text/plain", format!("{user}-{num}")))
        },
    )
    .unwrap();
    api.route("/add", RouteOptions::new().methods(["POST"]), |ctx| {
        Ok(Reply::new(
            Status::Ok,
            "text/plain",
            ctx.body.unwrap_or_default(),
        ))
    })
    .unwrap();
    api.route("/secret", RouteOptions::new().token(true), |ctx| {
        Ok(Reply::new(
            Status::Ok,
            "text/plain",
            ctx.query("q").unwrap_or("").to_owned(),
        ))
    })
    .unwrap();
    api.route("/pix", RouteOptions::new(), |_| {
        Ok(Reply::new(Status::Ok, "image/png", PNG_MAGIC.to_vec()))
    })
    .unwrap();
    lambda_proxy::local::router(Arc::new(api))
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

#[tokio::test]
async fn get_with_path_args() {
    let response = build_app()
        .oneshot(
            Request::builder()
                .uri("/remotepixel/2")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "text/plain");
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
    assert_eq!(body_bytes(response).await, b"remotepixel-2");
}

#[tokio::test]
async fn post_body_is_forwarded() {
    let response = build_app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/add")
                .body(Body::from("0.5"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"0.5");
}

#[tokio::test]
async fn query_and_token_come_from_url() {
    let response = build_app()
        .oneshot(
            Request::builder()
                .uri("/secret?access_token=YO&q=hello")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"hello");

    let response = build_app()
        .oneshot(
            Request::builder()
                .uri("/secret?access_token=nope")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn binary_reply_is_decoded_back_to_bytes() {
    let response = build_app()
        .oneshot(Request::builder().uri("/pix").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "image/png");
    assert_eq!(body_bytes(response).await, PNG_MAGIC);
}

#[tokio::test]
async fn unknown_path_is_400_json() {
    let response = build_app()
        .oneshot(
            Request::builder()
                .uri("/a/b/c")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body["errorMessage"], "No view function for: /a/b/c");
}
