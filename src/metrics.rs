//! Prometheus metrics for the HTTP surface, the CoinGecko client and the
//! market data caches.
//!
//! - `http_server_requests_total{method,route,status}`
//! - `http_server_request_duration_seconds{method,route}`
//! - `coingecko_requests_total{endpoint,outcome}`
//! - `cache_gets_total{cache,result}` and `cache_entries{cache}`
//! - `app_build_info{version,build_date}`

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGaugeVec, Opts, Registry,
    TextEncoder,
};
use std::sync::{Once, OnceLock};

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

static INIT: Once = Once::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

/// HTTP requests by method, matched route and status.
pub static HTTP_REQUESTS: OnceLock<IntCounterVec> = OnceLock::new();

/// HTTP request latency by method and matched route.
pub static HTTP_LATENCY: OnceLock<HistogramVec> = OnceLock::new();

/// Outbound CoinGecko calls by endpoint and outcome.
pub static COINGECKO_REQUESTS: OnceLock<IntCounterVec> = OnceLock::new();

/// Cache lookups by cache name and hit/miss.
pub static CACHE_GETS: OnceLock<IntCounterVec> = OnceLock::new();

/// Live entries per cache.
pub static CACHE_ENTRIES: OnceLock<IntGaugeVec> = OnceLock::new();

pub static BUILD_INFO: OnceLock<IntGaugeVec> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Safe to call more than once; only the first call registers metrics.
pub fn init() {
    INIT.call_once(|| {
        let r = registry();

        macro_rules! register {
            ($metric:ident, $init:expr) => {
                match $init {
                    Ok(m) => {
                        if let Err(e) = r.register(Box::new(m.clone())) {
                            tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
                        }
                        let _ = $metric.set(m);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, concat!("Failed to create metric ", stringify!($metric)));
                    }
                }
            };
        }

        register!(HTTP_REQUESTS, IntCounterVec::new(Opts::new("http_server_requests_total", "HTTP requests handled"), &["method", "route", "status"]));
        register!(HTTP_LATENCY, HistogramVec::new(
            HistogramOpts::new("http_server_request_duration_seconds", "HTTP request latency")
                .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
            &["method", "route", "status"]));
        register!(COINGECKO_REQUESTS, IntCounterVec::new(Opts::new("coingecko_requests_total", "Requests sent to the CoinGecko API"), &["endpoint", "outcome"]));
        register!(CACHE_GETS, IntCounterVec::new(Opts::new("cache_gets_total", "Cache lookups"), &["cache", "result"]));
        register!(CACHE_ENTRIES, IntGaugeVec::new(Opts::new("cache_entries", "Entries currently held per cache"), &["cache"]));
        register!(BUILD_INFO, IntGaugeVec::new(Opts::new("app_build_info", "Build information"), &["version", "build_date"]));

        if let Some(g) = BUILD_INFO.get() {
            g.with_label_values(&[
                env!("CARGO_PKG_VERSION"),
                option_env!("VERGEN_BUILD_DATE").unwrap_or("unknown"),
            ])
            .set(1);
        }
    });
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

/// Record a handled HTTP request.
#[inline]
pub fn record_http_request(method: &str, route: &str, status: u16, duration_secs: f64) {
    let status = status.to_string();
    if let Some(c) = HTTP_REQUESTS.get() {
        c.with_label_values(&[method, route, &status]).inc();
    }
    if let Some(h) = HTTP_LATENCY.get() {
        h.with_label_values(&[method, route, &status])
            .observe(duration_secs);
    }
}

/// Record an outbound CoinGecko call.
#[inline]
pub fn record_coingecko_request(endpoint: &str, outcome: &str) {
    if let Some(c) = COINGECKO_REQUESTS.get() {
        c.with_label_values(&[endpoint, outcome]).inc();
    }
}

/// Record a cache lookup.
#[inline]
pub fn record_cache_get(cache: &str, hit: bool) {
    if let Some(c) = CACHE_GETS.get() {
        c.with_label_values(&[cache, if hit { "hit" } else { "miss" }])
            .inc();
    }
}

#[inline]
pub fn set_cache_entries(cache: &str, entries: usize) {
    if let Some(g) = CACHE_ENTRIES.get() {
        g.with_label_values(&[cache]).set(entries as i64);
    }
}
