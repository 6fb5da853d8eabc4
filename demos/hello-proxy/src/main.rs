use std::net::SocketAddr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use clap::Parser;
use lambda_proxy::{Api, Compression, ProxyState, Reply, RouteError, RouteOptions, Status};

/// 1x1 transparent PNG.
const PIXEL_PNG: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR42mNkYAAAAAYAAjCB0C8AAAAASUVORK5CYII=";

#[derive(Parser)]
#[command(name = "bootstrap", about = "hello-proxy Lambda function")]
struct Args {
    /// Serve over plain HTTP instead of the Lambda runtime
    #[arg(long, value_name = "ADDR")]
    local: Option<SocketAddr>,
    /// Log at debug level
    #[arg(long)]
    debug: bool,
}

fn app(state: ProxyState) -> Result<Api, RouteError> {
    let mut api = Api::with_state("app", state);
    let cors = || RouteOptions::new().cors(true);

    api.route("/", cors(), |_| Ok(Reply::new(Status::Ok, "text/plain", "Yo")))?
        .route("/add", cors().methods(["GET", "POST"]), |ctx| {
            Ok(Reply::new(
                Status::Ok,
                "text/plain",
                ctx.body.unwrap_or_default(),
            ))
        })?
        .route("/kw/<string:user>", cors(), |ctx| {
            let user = ctx.arg("user").map(ToString::to_string).unwrap_or_default();
            let extra: Vec<String> = {
                let mut keys: Vec<_> = ctx.query.iter().collect();
                keys.sort();
                keys.into_iter().map(|(k, v)| format!("{k}={v}")).collect()
            };
            Ok(Reply::new(
                Status::Ok,
                "text/plain",
                format!("{user} {}", extra.join("&")).trim_end().to_owned(),
            ))
        })?
        .route("/ctx/<string:user>", cors(), |ctx| {
            let user = ctx.arg("user").map(ToString::to_string).unwrap_or_default();
            let request_id = ctx
                .context
                .as_ref()
                .map(|c| c.request_id.clone())
                .unwrap_or_else(|| "local".to_owned());
            Ok(Reply::new(
                Status::Ok,
                "text/plain",
                format!("{user}-{request_id}"),
            ))
        })?
        .route("/json", cors(), |_| {
            Ok(Reply::json(
                Status::Ok,
                &serde_json::json!({"app": "it works"}),
            )?)
        })?
        .route(
            "/binary",
            cors().compression(Compression::Gzip),
            |_| Ok(Reply::new(Status::Ok, "image/png", STANDARD.decode(PIXEL_PNG)?)),
        )?
        .route(
            "/b64binary",
            cors().compression(Compression::Gzip).b64encode(true),
            |_| Ok(Reply::new(Status::Ok, "image/png", STANDARD.decode(PIXEL_PNG)?)),
        )?
        .route("/private", cors().token(true), |_| {
            Ok(Reply::new(Status::Ok, "text/plain", "secret"))
        })?
        // Catch-all user routes go last: first match wins
        .route("/<string:user>", cors(), user_num)?
        .route("/<string:user>/<int:num>", cors(), user_num)?;

    Ok(api)
}

fn user_num(ctx: lambda_proxy::RouteContext) -> lambda_proxy::ViewResult {
    let user = ctx.arg("user").map(ToString::to_string).unwrap_or_default();
    let num = ctx.arg("num").and_then(|a| a.as_int()).unwrap_or(0);
    Ok(Reply::new(Status::Ok, "text/plain", format!("{user}-{num}")))
}

#[tokio::main]
async fn main() -> Result<(), lambda_runtime::Error> {
    let args = Args::parse();
    lambda_proxy::logging::init("app", args.debug);

    let api = app(ProxyState::load())?;
    match args.local {
        Some(addr) => lambda_proxy::local::serve(api, addr).await?,
        None => api.run().await?,
    }
    Ok(())
}
