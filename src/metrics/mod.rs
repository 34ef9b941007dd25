//! Prometheus collectors for the watch subsystem and the `/kv` endpoints.
//!
//! All collectors live in [`REGISTRY`] under the `watchkv_` namespace. The
//! optional scrape endpoint is served by [`start_server`].

use lazy_static::lazy_static;
use prometheus::Encoder;
use prometheus::IntCounter;
use prometheus::IntCounterVec;
use prometheus::IntGauge;
use prometheus::Opts;
use prometheus::Registry;
use tokio::sync::watch;
use tracing::error;
use tracing::info;
use warp::Filter;
use warp::Rejection;
use warp::Reply;


pub const METRICS_NAMESPACE: &str = "watchkv";

lazy_static! {
    pub static ref ACTIVE_WATCHERS: IntGauge =
        IntGauge::new("active_watchers", "Registrations currently waiting for a change")
            .expect("metric can not be created");

    pub static ref WATCH_OUTCOMES: IntCounterVec = IntCounterVec::new(
        Opts::new("watch_outcomes", "Terminal states reached by watch sessions"),
        &["outcome"]
    )
    .expect("metric can not be created");

    pub static ref DROPPED_NOTIFICATIONS: IntCounter = IntCounter::new(
        "dropped_notifications",
        "Notifications discarded because the watcher could not accept them"
    )
    .expect("metric can not be created");

    pub static ref KV_REQUESTS: IntCounterVec = IntCounterVec::new(
        Opts::new("kv_requests", "Key-value requests by operation and status"),
        &["op", "status"]
    )
    .expect("metric can not be created");

    pub static ref REGISTRY: Registry = {
        let registry = Registry::new_custom(Some(METRICS_NAMESPACE.to_string()), None)
            .expect("registry can be created");
        register_custom_metrics(&registry);
        registry
    };
}

fn register_custom_metrics(registry: &Registry) {
    registry
        .register(Box::new(ACTIVE_WATCHERS.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(WATCH_OUTCOMES.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(DROPPED_NOTIFICATIONS.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(KV_REQUESTS.clone()))
        .expect("collector can be registered");
}

pub(crate) fn record_kv_request(
    op: &str,
    status: u16,
) {
    KV_REQUESTS.with_label_values(&[op, &status.to_string()]).inc();
}

/// Serves `GET /metrics` on `port` until the shutdown signal fires.
pub async fn start_server(
    port: u16,
    mut shutdown_signal: watch::Receiver<()>,
) {
    let metrics_route = warp::path!("metrics").and(warp::get()).and_then(metrics_handler);

    match warp::serve(metrics_route).try_bind_with_graceful_shutdown(
        ([0, 0, 0, 0], port),
        async move {
            let _ = shutdown_signal.changed().await;
        },
    ) {
        Ok((addr, server)) => {
            info!(%addr, "metrics server started");
            server.await;
            info!("metrics server stopped");
        }
        Err(e) => error!(port, "metrics server failed to bind: {}", e),
    }
}

async fn metrics_handler() -> Result<impl Reply, Rejection> {
    Ok(gather_text())
}

/// Renders every collector in the text exposition format.
pub fn gather_text() -> String {
    let encoder = prometheus::TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        error!("could not encode custom metrics: {}", e);
    }
    String::from_utf8(buffer).unwrap_or_else(|e| {
        error!("custom metrics could not be from_utf8'd: {}", e);
        String::default()
    })
}
