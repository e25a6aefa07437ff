//! Route registration with page and streaming handler shapes.
//!
//! Patterns use `{name}` segments (`/api/remotes/{name}/browse`); the values
//! reach handlers through [`Context::param`].
//!
//! - **Page handlers** return one complete HTML body. An error becomes a 500
//!   response whose body is an error fragment.
//! - **Streaming handlers** run in their own task and write to the request's
//!   [`UpdateChannel`](crate::updates::UpdateChannel) while the response
//!   streams. Headers are already flushed by the time they fail, so an error
//!   becomes one final error patch into the channel's error region.
//! - **JSON handlers** return one serializable value.

use crate::config::ServerConfig;
use crate::context::Context;
use crate::error::{error_fragment, PanelError};
use crate::updates::UpdateChannel;
use axum::body::Bytes;
use axum::extract::{Path, Query};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Json};
use axum::routing::{on, MethodFilter};
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, warn};

/// Convert `{name}` segments to the `:name` form axum 0.7 matches on.
pub fn axum_path(pattern: &str) -> String {
    pattern
        .split('/')
        .map(|segment| match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Some(name) => format!(":{}", name),
            None => segment.to_string(),
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn build_context(
    params: Option<Path<HashMap<String, String>>>,
    query: HashMap<String, String>,
    headers: HeaderMap,
    body: Bytes,
) -> Context {
    let params = params.map(|Path(p)| p).unwrap_or_default();
    Context::new(params, query, headers, body)
}

/// Router over shared state `S`, handed by value to every handler.
pub struct PanelRouter<S> {
    state: S,
    routes: axum::Router,
}

impl<S> PanelRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn new(state: S) -> Self {
        Self {
            state,
            routes: axum::Router::new(),
        }
    }

    /// Register a handler producing a full HTML page on GET.
    pub fn page<F, Fut>(mut self, pattern: &str, handler: F) -> Self
    where
        F: Fn(S, Context) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = Result<String, PanelError>> + Send + 'static,
    {
        let state = self.state.clone();
        let route = pattern.to_string();
        let endpoint = move |params: Option<Path<HashMap<String, String>>>,
                             Query(query): Query<HashMap<String, String>>,
                             headers: HeaderMap,
                             body: Bytes| {
            let state = state.clone();
            let handler = handler.clone();
            let route = route.clone();
            async move {
                let ctx = build_context(params, query, headers, body);
                debug!("page {}: context built", route);
                match handler(state, ctx).await {
                    Ok(html) => Html(html).into_response(),
                    Err(err) => {
                        error!("page {} failed: {}", route, err);
                        (
                            StatusCode::INTERNAL_SERVER_ERROR,
                            Html(error_fragment(&err.to_string())),
                        )
                            .into_response()
                    }
                }
            }
        };
        self.routes = self
            .routes
            .route(&axum_path(pattern), on(MethodFilter::GET, endpoint));
        self
    }

    /// Register a handler returning a JSON body on GET.
    pub fn json<F, Fut, T>(mut self, pattern: &str, handler: F) -> Self
    where
        F: Fn(S, Context) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = Result<T, PanelError>> + Send + 'static,
        T: Serialize + 'static,
    {
        let state = self.state.clone();
        let route = pattern.to_string();
        let endpoint = move |params: Option<Path<HashMap<String, String>>>,
                             Query(query): Query<HashMap<String, String>>,
                             headers: HeaderMap,
                             body: Bytes| {
            let state = state.clone();
            let handler = handler.clone();
            let route = route.clone();
            async move {
                let ctx = build_context(params, query, headers, body);
                match handler(state, ctx).await {
                    Ok(value) => Json(value).into_response(),
                    Err(err) => {
                        error!("json {} failed: {}", route, err);
                        (
                            StatusCode::INTERNAL_SERVER_ERROR,
                            Json(serde_json::json!({ "error": err.to_string() })),
                        )
                            .into_response()
                    }
                }
            }
        };
        self.routes = self
            .routes
            .route(&axum_path(pattern), on(MethodFilter::GET, endpoint));
        self
    }

    /// Register a streaming handler for `method` on `pattern`.
    pub fn stream<F, Fut>(mut self, method: MethodFilter, pattern: &str, handler: F) -> Self
    where
        F: Fn(S, Context) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = Result<(), PanelError>> + Send + 'static,
    {
        let state = self.state.clone();
        let route = pattern.to_string();
        let endpoint = move |params: Option<Path<HashMap<String, String>>>,
                             Query(query): Query<HashMap<String, String>>,
                             headers: HeaderMap,
                             body: Bytes| {
            let state = state.clone();
            let handler = handler.clone();
            let route = route.clone();
            async move {
                let (channel, events) = UpdateChannel::open(ServerConfig::UPDATE_CHANNEL_CAPACITY);
                let ctx = build_context(params, query, headers, body).with_updates(channel.clone());
                debug!("stream {}: context built", route);

                tokio::spawn(async move {
                    match handler(state, ctx).await {
                        Ok(()) => debug!("stream {} completed", route),
                        Err(err) if err.is_reportable() => {
                            warn!("stream {} failed: {}", route, err);
                            channel.report_error(&err).await;
                        }
                        Err(_) => debug!("stream {}: peer disconnected", route),
                    }
                });

                events.into_response()
            }
        };
        self.routes = self
            .routes
            .route(&axum_path(pattern), on(method, endpoint));
        self
    }

    pub fn get<F, Fut>(self, pattern: &str, handler: F) -> Self
    where
        F: Fn(S, Context) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = Result<(), PanelError>> + Send + 'static,
    {
        self.stream(MethodFilter::GET, pattern, handler)
    }

    pub fn post<F, Fut>(self, pattern: &str, handler: F) -> Self
    where
        F: Fn(S, Context) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = Result<(), PanelError>> + Send + 'static,
    {
        self.stream(MethodFilter::POST, pattern, handler)
    }

    pub fn delete<F, Fut>(self, pattern: &str, handler: F) -> Self
    where
        F: Fn(S, Context) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = Result<(), PanelError>> + Send + 'static,
    {
        self.stream(MethodFilter::DELETE, pattern, handler)
    }

    /// Finish into an axum router with request tracing.
    pub fn into_router(self) -> axum::Router {
        self.routes
            .fallback(|| async { (StatusCode::NOT_FOUND, Html(error_fragment("not found"))) })
            .layer(TraceLayer::new_for_http())
    }
}
