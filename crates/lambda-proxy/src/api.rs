use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use lambda_runtime::{LambdaEvent, service_fn};

use crate::auth::{ACCESS_TOKEN_PARAM, validate_token};
use crate::error::RouteError;
use crate::event::{ProxyEvent, ProxyResponse};
use crate::response::{Compression, Reply, ResponseOptions, Status, into_proxy_response};
use crate::route::{PathArg, Pattern};
use crate::state::ProxyState;

/// Error returned by a view. Rendered as `{"errorMessage": "<error>"}`.
pub type ViewError = Box<dyn std::error::Error + Send + Sync>;

pub type ViewResult = Result<Reply, ViewError>;

type View = Arc<dyn Fn(RouteContext) -> ViewResult + Send + Sync>;

/// Everything a view gets for one request.
#[derive(Debug, Clone)]
pub struct RouteContext {
    /// Converted path arguments in pattern order.
    pub args: Vec<(String, PathArg)>,
    /// Query parameters with `access_token` removed.
    pub query: HashMap<String, String>,
    /// Request body, only for `POST`.
    pub body: Option<String>,
    pub event: ProxyEvent,
    /// Invocation context; `None` outside the Lambda runtime.
    pub context: Option<lambda_runtime::Context>,
}

impl RouteContext {
    pub fn arg(&self, name: &str) -> Option<&PathArg> {
        self.args.iter().find(|(n, _)| n == name).map(|(_, a)| a)
    }

    pub fn query(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }
}

/// Per-route settings.
///
/// Defaults: `GET` only, no CORS, no token, no compression, no forced
/// base64.
#[derive(Debug, Clone)]
pub struct RouteOptions {
    methods: Vec<String>,
    cors: bool,
    token: bool,
    compression: Option<Compression>,
    b64encode: bool,
    name: Option<String>,
}

impl Default for RouteOptions {
    fn default() -> Self {
        Self {
            methods: vec!["GET".to_owned()],
            cors: false,
            token: false,
            compression: None,
            b64encode: false,
            name: None,
        }
    }
}

impl RouteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn methods<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.methods = methods.into_iter().map(Into::into).collect();
        self
    }

    pub fn cors(mut self, cors: bool) -> Self {
        self.cors = cors;
        self
    }

    /// Require `access_token` to equal the `TOKEN` environment variable.
    pub fn token(mut self, token: bool) -> Self {
        self.token = token;
        self
    }

    /// Compress replies when the client's `Accept-Encoding` allows it.
    pub fn compression(mut self, compression: Compression) -> Self {
        self.compression = Some(compression);
        self
    }

    /// Base64-encode replies with a binary content type.
    pub fn b64encode(mut self, b64encode: bool) -> Self {
        self.b64encode = b64encode;
        self
    }

    /// View name used in logs. Defaults to the view's type name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// A registered view and its settings.
pub struct RouteEntry {
    view: View,
    view_name: String,
    pattern: Pattern,
    options: RouteOptions,
}

impl RouteEntry {
    pub fn view_name(&self) -> &str {
        &self.view_name
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn methods(&self) -> &[String] {
        &self.options.methods
    }

    pub fn cors(&self) -> bool {
        self.options.cors
    }

    pub fn token(&self) -> bool {
        self.options.token
    }

    pub fn compression(&self) -> Option<Compression> {
        self.options.compression
    }

    pub fn b64encode(&self) -> bool {
        self.options.b64encode
    }
}

impl fmt::Debug for RouteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteEntry")
            .field("view_name", &self.view_name)
            .field("pattern", &self.pattern.as_str())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Router for API Gateway proxy events.
///
/// Routes are tried in registration order; the first pattern that matches
/// the whole request path wins.
#[derive(Debug)]
pub struct Api {
    app_name: String,
    routes: Vec<RouteEntry>,
    state: ProxyState,
}

impl Api {
    /// New router with [`ProxyState`] loaded from the environment.
    pub fn new(app_name: impl Into<String>) -> Self {
        Self::with_state(app_name, ProxyState::load())
    }

    pub fn with_state(app_name: impl Into<String>, state: ProxyState) -> Self {
        Self {
            app_name: app_name.into(),
            routes: Vec::new(),
            state,
        }
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn routes(&self) -> &[RouteEntry] {
        &self.routes
    }

    /// Register `view` for the URI pattern `path`.
    pub fn route<F>(
        &mut self,
        path: &str,
        options: RouteOptions,
        view: F,
    ) -> Result<&mut Self, RouteError>
    where
        F: Fn(RouteContext) -> ViewResult + Send + Sync + 'static,
    {
        if self.routes.iter().any(|r| r.pattern.as_str() == path) {
            return Err(RouteError::DuplicateRoute {
                path: path.to_owned(),
            });
        }
        let pattern = Pattern::parse(path)?;
        let view_name = options
            .name
            .clone()
            .unwrap_or_else(|| std::any::type_name::<F>().to_owned());

        tracing::debug!(
            app = %self.app_name,
            path,
            view = %view_name,
            methods = ?options.methods,
            "route registered"
        );
        self.routes.push(RouteEntry {
            view: Arc::new(view),
            view_name,
            pattern,
            options,
        });
        Ok(self)
    }

    /// Handle one proxy event. Never fails: every error becomes a response.
    pub fn dispatch(
        &self,
        event: ProxyEvent,
        context: Option<lambda_runtime::Context>,
    ) -> ProxyResponse {
        tracing::debug!(headers = %to_json(&event.headers), "request headers");
        tracing::debug!(
            query = %redacted_query(&event.query_string_parameters),
            "query parameters"
        );
        tracing::debug!(params = %to_json(&event.path_parameters), "path parameters");

        let Some(path) = event.path.clone() else {
            return plain(Reply::message(
                Status::Nok,
                "errorMessage",
                "Missing route parameter",
            ));
        };

        let Some((entry, args)) = self
            .routes
            .iter()
            .find_map(|r| r.pattern.matches(&path).map(|args| (r, args)))
        else {
            return plain(Reply::message(
                Status::Nok,
                "errorMessage",
                &format!("No view function for: {path}"),
            ));
        };

        let mut query = event.query_string_parameters.clone();

        if entry.options.token {
            let provided = query.get(ACCESS_TOKEN_PARAM).map(String::as_str);
            if !validate_token(&self.state, provided) {
                tracing::warn!(path = %path, view = %entry.view_name, "invalid access token");
                return plain(Reply::message(
                    Status::Error,
                    "message",
                    "Invalid access token",
                ));
            }
        }

        let method = event.http_method.clone().unwrap_or_default();
        if !entry.options.methods.iter().any(|m| *m == method) {
            return plain(Reply::message(
                Status::Nok,
                "errorMessage",
                &format!("Unsupported method: {method}"),
            ));
        }

        query.remove(ACCESS_TOKEN_PARAM);

        let compression = entry.options.compression.filter(|c| {
            event
                .header("Accept-Encoding")
                .is_some_and(|accept| accept.contains(c.as_str()))
        });

        let ctx = RouteContext {
            args,
            query,
            body: if method == "POST" { event.body.clone() } else { None },
            event,
            context,
        };

        let reply = (entry.view)(ctx).unwrap_or_else(|err| {
            tracing::error!(view = %entry.view_name, path = %path, "{err}");
            Reply::message(Status::Error, "errorMessage", &err.to_string())
        });

        into_proxy_response(
            reply,
            &ResponseOptions {
                cors: entry.options.cors,
                methods: &entry.options.methods,
                compression,
                b64encode: entry.options.b64encode,
            },
        )
    }

    /// Drive the Lambda runtime loop, dispatching every invocation.
    pub async fn run(self) -> Result<(), lambda_runtime::Error> {
        let api = Arc::new(self);
        tracing::debug!(app = %api.app_name, routes = api.routes.len(), "starting runtime");

        lambda_runtime::run(service_fn(move |event: LambdaEvent<ProxyEvent>| {
            let api = Arc::clone(&api);
            async move {
                let LambdaEvent { payload, context } = event;
                Ok::<_, lambda_runtime::Error>(api.dispatch(payload, Some(context)))
            }
        }))
        .await
    }
}

fn plain(reply: Reply) -> ProxyResponse {
    into_proxy_response(reply, &ResponseOptions::plain())
}

fn to_json(map: &HashMap<String, String>) -> String {
    serde_json::to_string(map).unwrap_or_default()
}

/// Query parameters as JSON with the access token masked.
fn redacted_query(query: &HashMap<String, String>) -> String {
    let masked: HashMap<&str, &str> = query
        .iter()
        .map(|(k, v)| {
            let v = if k == ACCESS_TOKEN_PARAM { "[REDACTED]" } else { v.as_str() };
            (k.as_str(), v)
        })
        .collect();
    serde_json::to_string(&masked).unwrap_or_default()
}
