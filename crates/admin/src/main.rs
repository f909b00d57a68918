//! Dukkan admin - internal back-office.
//!
//! This binary serves the staff panel on port 3001.
//!
//! # Security
//!
//! Bind to a private interface or put the panel behind a VPN or an
//! authenticating proxy. Staff sign in with email and password; login
//! attempts are rate limited per client IP.
//!
//! # Architecture
//!
//! - Axum web framework
//! - Askama templates for server-side rendering, English and left-to-right
//! - `PostgreSQL` shared with the storefront for catalog, orders and sessions

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::SocketAddr;
use std::time::Duration;

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, Response, StatusCode};
use axum::{Router, middleware::from_fn, routing::get};
use axum_server::Handle;
use axum_server::tls_rustls::RustlsConfig;
use secrecy::ExposeSecret;
use sentry::integrations::tracing as sentry_tracing;
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tower_sessions::SessionManagerLayer;
use tower_sessions_sqlx_store::PostgresStore;
use tracing::{Level, Span};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dukkan_admin::config::AdminConfig;
use dukkan_admin::state::AppState;
use dukkan_admin::{db, filters, middleware, routes};

/// Time in-flight requests get to finish after a shutdown signal.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Sentry first, then the subscriber that forwards warnings and errors to it.
///
/// The returned guard flushes pending events on drop.
fn init_telemetry(config: &AdminConfig) -> Option<sentry::ClientInitGuard> {
    let guard = config.sentry_dsn.as_deref().map(|dsn| {
        sentry::init((
            dsn,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                environment: config.sentry_environment.clone().map(Into::into),
                sample_rate: config.sentry_sample_rate,
                traces_sample_rate: config.sentry_traces_sample_rate,
                attach_stacktrace: true,
                // Staff identities help triage back-office errors
                send_default_pii: true,
                ..Default::default()
            },
        ))
    });
    // Both binaries report to one Sentry project.
    sentry::configure_scope(|scope| scope.set_tag("service", "admin"));

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "dukkan_admin=info,tower_http=info,sqlx=warn".into());
    let sentry_layer = sentry_tracing::layer().event_filter(|metadata| match *metadata.level() {
        Level::ERROR | Level::WARN => sentry_tracing::EventFilter::Event,
        Level::INFO => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            config
                .log_json
                .then(|| tracing_subscriber::fmt::layer().json().flatten_event(true)),
        )
        .with((!config.log_json).then(tracing_subscriber::fmt::layer))
        .with(sentry_layer)
        .init();

    if guard.is_some() {
        tracing::info!("Sentry enabled");
    }
    guard
}

/// Span per request. Query strings carry staff searches and stay out of logs.
fn request_span(request: &Request<Body>) -> Span {
    tracing::info_span!(
        "admin_request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = tracing::field::Empty,
        status = tracing::field::Empty,
        latency_ms = tracing::field::Empty,
    )
}

fn record_response(response: &Response<Body>, latency: Duration, span: &Span) {
    span.record("status", response.status().as_u16());
    span.record(
        "latency_ms",
        u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
    );
    DefaultOnResponse::new()
        .level(Level::INFO)
        .on_response(response, latency, span);
}

fn app(state: AppState, session_layer: SessionManagerLayer<PostgresStore>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::routes())
        .nest_service("/static", ServeDir::new("crates/admin/static"))
        .layer(from_fn(middleware::security_headers_middleware))
        .layer(session_layer)
        .layer(from_fn(middleware::csp_nonce_middleware))
        .layer(from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(request_span)
                .on_response(record_response),
        )
        .with_state(state)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

#[tokio::main]
async fn main() {
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    let config = AdminConfig::from_env().expect("Failed to load configuration");
    let _sentry_guard = init_telemetry(&config);
    filters::set_store_offset(config.store_utc_offset_minutes);

    // Migrations are applied with `dukkan-cli migrate`, never at startup.
    let pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool");

    let session_layer = middleware::create_session_layer(&pool, &config);
    let app = app(AppState::new(config.clone(), pool), session_layer);

    // Peer addresses feed the login rate limiter when no proxy header is present.
    let service = app.into_make_service_with_connect_info::<SocketAddr>();
    let addr = config.socket_addr();

    let Some(tls) = &config.tls else {
        tracing::info!(%addr, "admin listening over plain HTTP");
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .expect("Failed to bind to address");
        axum::serve(listener, service)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .expect("Server error");
        return;
    };

    let rustls_config = RustlsConfig::from_pem(
        tls.cert_pem.as_bytes().to_vec(),
        tls.key_pem.expose_secret().as_bytes().to_vec(),
    )
    .await
    .expect("Failed to load TLS certificates");

    let handle = Handle::new();
    tokio::spawn({
        let handle = handle.clone();
        async move {
            shutdown_signal().await;
            handle.graceful_shutdown(Some(DRAIN_TIMEOUT));
        }
    });

    tracing::info!(%addr, "admin listening over HTTPS");
    axum_server::bind_rustls(addr, rustls_config)
        .handle(handle)
        .serve(service)
        .await
        .expect("Server error");
}

/// Liveness only; never touches the database.
async fn health() -> &'static str {
    "ok"
}

/// 503 until the database answers.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(state.pool())
        .await
    {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// Resolves on Ctrl+C, or SIGTERM from the process supervisor.
async fn shutdown_signal() {
    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                tracing::warn!(error = %e, "Ctrl+C handler unavailable");
            }
        }
        () = terminate => {}
    }
    tracing::info!("Shutting down; draining open requests");
}
