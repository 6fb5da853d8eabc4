//! Path router for AWS Lambda functions behind an API Gateway proxy
//! integration.
//!
//! Register views against URI patterns, then hand the [`Api`] to the Lambda
//! runtime. Each invocation is matched to a view, checked for token and
//! method, and the view's [`Reply`] is turned into an API Gateway proxy
//! response (CORS headers, optional compression, base64 for binary bodies).
//!
//! ```rust,no_run
//! use lambda_proxy::{Api, Reply, RouteOptions, Status};
//!
//! # async fn run() -> Result<(), lambda_runtime::Error> {
//! lambda_proxy::logging::init("app", false);
//!
//! let mut api = Api::new("app");
//! api.route("/", RouteOptions::new().cors(true), |_ctx| {
//!     Ok(Reply::new(Status::Ok, "text/plain", "Yo"))
//! })?;
//! api.route("/<string:user>/<int:num>", RouteOptions::new(), |ctx| {
//!     let user = ctx.arg("user").map(ToString::to_string).unwrap_or_default();
//!     let num = ctx.arg("num").and_then(|a| a.as_int()).unwrap_or(0);
//!     Ok(Reply::new(Status::Ok, "text/plain", format!("{user}-{num}")))
//! })?;
//!
//! api.run().await
//! # }
//! ```
//!
//! # Path patterns
//!
//! | Placeholder | Matches | Argument |
//! |-------------|---------|----------|
//! | `<name>`, `<string:name>` | `[a-zA-Z0-9_]+` | [`PathArg::Str`] |
//! | `<int:name>` | `[0-9]+` | [`PathArg::Int`] |
//! | `<float:name>` | `[+-]?[0-9]+\.[0-9]+` | [`PathArg::Float`] |
//! | `<uuid:name>` | lowercase 8-4-4-4-12 hex | [`PathArg::Uuid`] |
//!
//! # Feature flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `local` | no | axum server that feeds plain HTTP requests through an [`Api`] |

pub mod api;
pub mod auth;
pub mod error;
pub mod event;
pub mod logging;
pub mod response;
pub mod route;
pub mod state;

#[cfg(feature = "local")]
pub mod local;

pub use api::{Api, RouteContext, RouteEntry, RouteOptions, ViewError, ViewResult};
pub use error::RouteError;
pub use event::{ProxyEvent, ProxyResponse};
pub use response::{Body, Compression, Reply, Status};
pub use route::{PathArg, Pattern};
pub use state::ProxyState;
