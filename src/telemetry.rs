//! # Request Tracing and Log Setup
//!
//! Every request runs under a [`TraceContext`] carrying its correlation id,
//! taken from the caller's `X-Trace-Id` header or minted on entry. The
//! context lives in task-local storage so error responses can stamp the id
//! without threading it through every call.

use std::any::type_name_of_val;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use log::LevelFilter;
use tokio::task_local;
use tracing_log::LogTracer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::Layer,
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::config::AppConfig;

/// Header carrying the request correlation id, echoed on every response.
pub const TRACE_HEADER: &str = "X-Trace-Id";

/// Correlation metadata for one request.
#[derive(Debug, Clone)]
pub struct TraceContext {
    pub trace_id: String,
}

impl TraceContext {
    pub fn new(trace_id: impl Into<String>) -> Self {
        Self {
            trace_id: trace_id.into(),
        }
    }

    /// Build a context from request headers, minting a fresh id when the
    /// caller did not supply one.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let trace_id = headers
            .get(TRACE_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        Self::new(trace_id)
    }
}

task_local! {
    static ACTIVE_TRACE_CONTEXT: TraceContext;
}

/// Middleware that scopes the request under its [`TraceContext`] and echoes
/// the trace id back to the caller.
pub async fn trace_middleware(request: Request, next: Next) -> Response {
    let context = TraceContext::from_headers(request.headers());
    let trace_id = context.trace_id.clone();

    let mut response = with_trace_context(context, next.run(request)).await;

    if let Ok(header_value) = trace_id.parse() {
        response.headers_mut().insert(TRACE_HEADER, header_value);
    }

    response
}

/// Execute `future` with the given context available through task-local
/// storage for its whole duration.
pub async fn with_trace_context<Fut, R>(context: TraceContext, future: Fut) -> R
where
    Fut: std::future::Future<Output = R>,
{
    ACTIVE_TRACE_CONTEXT.scope(context, future).await
}

/// Trace id of the running task, if it was entered through the middleware.
pub fn current_trace_id() -> Option<String> {
    ACTIVE_TRACE_CONTEXT
        .try_with(|ctx| ctx.trace_id.clone())
        .ok()
}

static TELEMETRY_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Initialize global tracing/logging exactly once.
///
/// Setup failures leave whatever subscriber is already registered in effect
/// and warn on stderr instead of aborting startup.
pub fn init_tracing(config: &AppConfig) {
    if TELEMETRY_INITIALIZED
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        return;
    }

    install_log_bridge();

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    if let Err(err) = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer(&config.log_format))
        .try_init()
    {
        TELEMETRY_INITIALIZED.store(false, Ordering::SeqCst);
        eprintln!(
            "Warning: failed to set global tracing subscriber: {}. Default subscriber remains in effect.",
            err
        );
    }
}

/// Route legacy `log::` macros into the tracing pipeline.
fn install_log_bridge() {
    if let Err(err) = LogTracer::builder()
        .with_max_level(LevelFilter::Trace)
        .init()
    {
        // A bridge registered earlier (e.g. by a test harness) is fine.
        let logger_type = type_name_of_val(log::logger());
        if !logger_type.contains("LogTracer") {
            eprintln!(
                "Warning: failed to install log tracer bridge: {}. Legacy `log::` macros will not emit tracing events.",
                err
            );
        }
    }
}

fn fmt_layer<S>(format: &str) -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    match format {
        "pretty" => fmt::layer().pretty().boxed(),
        "compact" => fmt::layer().compact().boxed(),
        _ => fmt::layer().json().boxed(),
    }
}
