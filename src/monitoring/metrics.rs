use once_cell::sync::Lazy;
use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};

// Global Prometheus registry
pub static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

fn env_name() -> String {
    std::env::var("APP_ENV")
        .ok()
        .unwrap_or_else(|| env!("APP_ENV_DEFAULT").to_string())
}

// App info gauge (const)
pub static APP_INFO: Lazy<IntGauge> = Lazy::new(|| {
    let g = IntGauge::with_opts(
        Opts::new("app_info", "Application info gauge")
            .const_label("app", env!("CARGO_PKG_NAME"))
            .const_label("env", env_name().as_str())
            .const_label("version", env!("CARGO_PKG_VERSION"))
            .const_label("git_sha", env!("GIT_SHA"))
            .const_label("build_time", env!("BUILD_TIME")),
    )
    .expect("app_info gauge definition");
    REGISTRY.register(Box::new(g.clone())).ok();
    g
});

#[doc(hidden)]
pub fn __test_parse_buckets_env(var: &str) -> Option<Vec<f64>> {
    parse_buckets_env(var)
}

fn parse_buckets_env(var: &str) -> Option<Vec<f64>> {
    match std::env::var(var) {
        Ok(val) if !val.trim().is_empty() => {
            let mut parsed: Vec<f64> = Vec::new();
            for tok in val.split(',') {
                let t = tok.trim();
                if t.is_empty() {
                    continue;
                }
                match t.parse::<f64>() {
                    Ok(v) if v > 0.0 => parsed.push(v),
                    _ => {
                        tracing::warn!(env_var = %var, token = %t, "Invalid histogram bucket value; ignoring");
                        return None;
                    }
                }
            }
            if parsed.is_empty() {
                None
            } else {
                parsed.sort_by(|a, b| a.total_cmp(b));
                Some(parsed)
            }
        }
        _ => None,
    }
}

pub static REQUEST_LATENCY_MS: Lazy<HistogramVec> = Lazy::new(|| {
    let default = vec![5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 5000.0, 30000.0];
    let buckets = parse_buckets_env("REQUEST_HISTO_BUCKETS").unwrap_or(default);
    let mut opts = HistogramOpts::new("request_latency_ms", "HTTP request latency in milliseconds")
        .buckets(buckets);
    opts.common_opts = opts.common_opts.const_label("env", env_name().as_str());
    let hv = HistogramVec::new(opts, &["service", "method", "route", "status_class"])
        .expect("request_latency_ms definition");
    REGISTRY.register(Box::new(hv.clone())).ok();
    hv
});

// Gateway metrics
pub static UPLOADS_FORWARDED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    let c = IntCounter::with_opts(
        Opts::new("uploads_forwarded_total", "Uploads relayed successfully to the ingestion service")
            .const_label("env", env_name().as_str()),
    )
    .expect("uploads_forwarded_total definition");
    REGISTRY.register(Box::new(c.clone())).ok();
    c
});

pub static UPSTREAM_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let opts = Opts::new("upstream_failures_total", "Failed calls to the ingestion service by kind")
        .const_label("env", env_name().as_str());
    let cv = IntCounterVec::new(opts, &["kind"]).expect("upstream_failures_total definition");
    REGISTRY.register(Box::new(cv.clone())).ok();
    cv
});

// Ingestion metrics
pub static DOCUMENTS_INGESTED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    let c = IntCounter::with_opts(
        Opts::new("documents_ingested_total", "Documents extracted, chunked and persisted")
            .const_label("env", env_name().as_str()),
    )
    .expect("documents_ingested_total definition");
    REGISTRY.register(Box::new(c.clone())).ok();
    c
});

pub static INGESTION_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let opts = Opts::new("ingestion_failures_total", "Ingestion failures by pipeline stage")
        .const_label("env", env_name().as_str());
    let cv = IntCounterVec::new(opts, &["stage"]).expect("ingestion_failures_total definition");
    REGISTRY.register(Box::new(cv.clone())).ok();
    cv
});

pub static CHUNKS_PER_DOCUMENT: Lazy<Histogram> = Lazy::new(|| {
    let default = vec![1.0, 2.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0];
    let buckets = parse_buckets_env("CHUNKS_HISTO_BUCKETS").unwrap_or(default);
    let mut opts = HistogramOpts::new("chunks_per_document", "Chunks produced per ingested document")
        .buckets(buckets);
    opts.common_opts = opts.common_opts.const_label("env", env_name().as_str());
    let h = Histogram::with_opts(opts).expect("chunks_per_document definition");
    REGISTRY.register(Box::new(h.clone())).ok();
    h
});

/// Register the info gauge so it shows up on the first scrape.
pub fn init() {
    APP_INFO.set(1);
}

pub fn record_upstream_failure(kind: &str) {
    UPSTREAM_FAILURES_TOTAL.with_label_values(&[kind]).inc();
}

pub fn record_ingestion_failure(stage: &str) {
    INGESTION_FAILURES_TOTAL.with_label_values(&[stage]).inc();
}

pub fn observe_ingested_document(total_chunks: usize) {
    DOCUMENTS_INGESTED_TOTAL.inc();
    CHUNKS_PER_DOCUMENT.observe(total_chunks as f64);
}

// Exporter for Prometheus text format
pub fn export_prometheus() -> String {
    let metric_families = REGISTRY.gather();
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if encoder.encode(&metric_families, &mut buffer).is_ok() {
        String::from_utf8(buffer).unwrap_or_default()
    } else {
        "".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_contains_registered_metrics() {
        init();
        observe_ingested_document(3);
        let text = export_prometheus();
        assert!(text.contains("app_info"));
        assert!(text.contains("documents_ingested_total"));
        assert!(text.contains("chunks_per_document"));
    }
}
