//! Dukkan storefront - public grocery shop.
//!
//! This binary serves the customer-facing storefront on port 3000.
//!
//! # Architecture
//!
//! - Axum web framework with HTMX for interactivity
//! - Askama templates for server-side rendering, Arabic and right-to-left
//! - `PostgreSQL` for catalog, carts, orders and sessions
//! - Pusher Channels for live new-order alerts in the admin

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::SocketAddr;

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::{Router, middleware::from_fn, routing::get};
use sentry::integrations::tracing::{self as sentry_tracing, EventFilter};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{Level, Metadata, Span};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dukkan_storefront::config::StorefrontConfig;
use dukkan_storefront::state::AppState;
use dukkan_storefront::{db, filters, middleware, routes};

fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_deref()?;
    let guard = sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config.sentry_environment.clone().map(Into::into),
            sample_rate: config.sentry_sample_rate,
            traces_sample_rate: config.sentry_traces_sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));
    // Both binaries report to one Sentry project.
    sentry::configure_scope(|scope| scope.set_tag("service", "storefront"));
    Some(guard)
}

/// Warnings and errors become Sentry events; info lines ride along as breadcrumbs.
fn sentry_filter(metadata: &Metadata<'_>) -> EventFilter {
    match *metadata.level() {
        Level::ERROR | Level::WARN => EventFilter::Event,
        Level::INFO => EventFilter::Breadcrumb,
        _ => EventFilter::Ignore,
    }
}

fn init_tracing(log_json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "dukkan_storefront=info,tower_http=info,sqlx=warn".into());

    tracing_subscriber::registry()
        .with(filter)
        .with(log_json.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true)))
        .with((!log_json).then(tracing_subscriber::fmt::layer))
        .with(sentry_tracing::layer().event_filter(sentry_filter))
        .init();
}

/// Path only: search terms and `next=` targets stay out of the logs.
fn request_span(request: &Request<Body>) -> Span {
    tracing::info_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = tracing::field::Empty,
    )
}

#[tokio::main]
async fn main() {
    let config = StorefrontConfig::from_env().expect("Failed to load configuration");

    // Sentry must be live before the subscriber that feeds it.
    let _sentry_guard = init_sentry(&config);
    init_tracing(config.log_json);
    filters::set_store_offset(config.store_utc_offset_minutes);

    // Migrations are applied with `dukkan-cli migrate`, never at startup.
    let pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool");

    let state = AppState::new(config.clone(), pool).expect("Failed to initialize application state");
    if state.pusher().is_none() {
        tracing::warn!("Pusher not configured; new orders will not be announced");
    }
    let session_layer = middleware::create_session_layer(state.pool(), state.config());

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/health/ready", get(readiness))
        .merge(routes::routes())
        .nest_service("/static", ServeDir::new("crates/storefront/static"))
        .layer(from_fn(middleware::security_headers_middleware))
        .layer(session_layer)
        .layer(from_fn(middleware::csp_nonce_middleware))
        .layer(from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .with_state(state)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");
    tracing::info!(%addr, base_url = %config.base_url, "storefront listening");

    // Peer addresses feed the rate limiter when no proxy header is present.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Server error");
}

/// 503 while the database is unreachable, so the load balancer stops routing here.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(state.pool())
        .await
    {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Database not ready");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let Ok(mut sigterm) = signal(SignalKind::terminate()) else {
            tracing::warn!("SIGTERM handler unavailable; stopping on Ctrl+C only");
            let _ = tokio::signal::ctrl_c().await;
            return;
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    tracing::info!("Shutdown requested; finishing in-flight requests");
}
