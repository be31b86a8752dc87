use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

// Declare the static OnceCell to hold the Metrics.
static METRICS_INSTANCE: OnceCell<Arc<Metrics>> = OnceCell::const_new();

/// Asynchronously initializes and gets a reference to the static `Metrics`.
pub async fn get_metrics() -> &'static Arc<Metrics> {
    METRICS_INSTANCE
        .get_or_init(|| async {
            info!("Initializing Metrics ...");
            Metrics::new()
        })
        .await
}

#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,

    // Token service metrics
    pub token_requests: IntCounterVec,
    pub grant_failures: IntCounterVec,
    pub grant_duration: HistogramVec,

    // Cache metrics
    pub cached_tokens: IntGauge,
    pub token_expiry_unix: IntGaugeVec,

    // Config/runtime
    pub config_validation_errors: IntCounter,
    pub configured_services: IntGauge,
    pub up: IntGauge,
}

impl Metrics {
    fn new() -> Arc<Self> {
        let registry = Registry::new_custom(Some("stationauth".into()), None)
            .unwrap_or_else(|_| Registry::new());

        let metrics = Arc::new(Self {
            token_requests: IntCounterVec::new(
                Opts::new("token_requests_total", "Token requests by outcome (reuse, client_credentials, refresh)"),
                &["token_key", "outcome"],
            )
            .expect("valid metric token_requests_total"),
            grant_failures: IntCounterVec::new(
                Opts::new("grant_failures_total", "Failed token grants"),
                &["token_key", "grant"],
            )
            .expect("valid metric grant_failures_total"),
            grant_duration: HistogramVec::new(
                HistogramOpts::new("grant_duration_seconds", "Token grant duration seconds")
                    .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
                &["token_key", "grant"],
            )
            .expect("valid metric grant_duration_seconds"),

            cached_tokens: IntGauge::new("cached_tokens", "Tokens held in the cache")
                .expect("valid metric cached_tokens"),
            token_expiry_unix: IntGaugeVec::new(
                Opts::new("token_expiry_unix_seconds", "Effective token expiry timestamp"),
                &["token_key"],
            )
            .expect("valid metric token_expiry_unix_seconds"),

            config_validation_errors: IntCounter::new(
                "config_validation_errors_total",
                "Validation errors during startup",
            )
            .expect("valid metric config_validation_errors_total"),
            configured_services: IntGauge::new("configured_services", "Downstream services configured")
                .expect("valid metric configured_services"),
            up: IntGauge::new("up", "1 if service is healthy").expect("valid metric up"),

            registry,
        });

        // Register all metrics in the registry
        let reg = &metrics.registry;
        let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
            Box::new(metrics.token_requests.clone()),
            Box::new(metrics.grant_failures.clone()),
            Box::new(metrics.grant_duration.clone()),
            Box::new(metrics.cached_tokens.clone()),
            Box::new(metrics.token_expiry_unix.clone()),
            Box::new(metrics.config_validation_errors.clone()),
            Box::new(metrics.configured_services.clone()),
            Box::new(metrics.up.clone()),
        ];
        for collector in collectors {
            if let Err(err) = reg.register(collector) {
                tracing::warn!("metric registration failed: {}", err);
            }
        }

        metrics
    }
}
