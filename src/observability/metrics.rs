use prometheus::{
    Encoder, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub handoffs_total: IntCounterVec,
    pub orders_created_total: IntCounter,
    pub idempotency_hits_total: IntCounter,
    pub lock_busy_total: IntCounter,
    pub handoff_latency_seconds: HistogramVec,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let handoffs_total = IntCounterVec::new(
            Opts::new("handoffs_total", "Handoff requests by action and outcome"),
            &["action", "outcome"],
        )
        .expect("valid handoffs_total metric");

        let orders_created_total =
            IntCounter::new("orders_created_total", "Total orders created")
                .expect("valid orders_created_total metric");

        let idempotency_hits_total = IntCounter::new(
            "idempotency_hits_total",
            "Requests answered verbatim from the idempotency cache",
        )
        .expect("valid idempotency_hits_total metric");

        let lock_busy_total = IntCounter::new(
            "lock_busy_total",
            "Lock acquisitions that exhausted their retries",
        )
        .expect("valid lock_busy_total metric");

        let handoff_latency_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "handoff_latency_seconds",
                "Latency of handoff processing in seconds",
            ),
            &["action"],
        )
        .expect("valid handoff_latency_seconds metric");

        registry
            .register(Box::new(handoffs_total.clone()))
            .expect("register handoffs_total");
        registry
            .register(Box::new(orders_created_total.clone()))
            .expect("register orders_created_total");
        registry
            .register(Box::new(idempotency_hits_total.clone()))
            .expect("register idempotency_hits_total");
        registry
            .register(Box::new(lock_busy_total.clone()))
            .expect("register lock_busy_total");
        registry
            .register(Box::new(handoff_latency_seconds.clone()))
            .expect("register handoff_latency_seconds");

        Self {
            registry,
            handoffs_total,
            orders_created_total,
            idempotency_hits_total,
            lock_busy_total,
            handoff_latency_seconds,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}
