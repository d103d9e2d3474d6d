use actix_web::HttpResponse;
use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounterVec, Opts, TextEncoder};

static GRAPH_OPERATIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "follower_service_graph_operations_total",
            "Graph operations handled by follower-service",
        ),
        &["operation", "outcome"],
    )
    .expect("failed to create follower_service_graph_operations_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register follower_service_graph_operations_total");
    counter
});

static STARTUP_CONNECT_ATTEMPTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "follower_service_startup_connect_attempts_total",
            "Graph store connection attempts made during startup",
        ),
        &["outcome"],
    )
    .expect("failed to create follower_service_startup_connect_attempts_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register follower_service_startup_connect_attempts_total");
    counter
});

pub fn record_operation(operation: &str, success: bool) {
    let outcome = if success { "success" } else { "error" };
    GRAPH_OPERATIONS_TOTAL
        .with_label_values(&[operation, outcome])
        .inc();
}

pub fn record_connect_attempt(success: bool) {
    let outcome = if success { "success" } else { "error" };
    STARTUP_CONNECT_ATTEMPTS_TOTAL
        .with_label_values(&[outcome])
        .inc();
}

pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
