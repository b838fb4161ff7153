use opentelemetry::global;
use opentelemetry::metrics::{Counter, Meter};
use opentelemetry_sdk::metrics::SdkMeterProvider;
use prometheus::Registry;
use std::sync::Arc;

/// Ambient counters for the control-plane half of the translator
/// (SPEC_FULL §4.G, §7): what the path service drained off the miss
/// ring, and what it did with each key. The fast path itself (egress
/// TC classifier, ingress XDP program) runs in a restricted in-kernel
/// context with no metrics client available to it, so per-packet
/// pass/drop counts are not exported here - see DESIGN.md.
#[derive(Clone)]
pub struct Metrics {
    pub misses_drained_total: Counter<u64>,

    pub resolutions_succeeded_total: Counter<u64>,
    pub resolutions_failed_total: Counter<u64>,

    pub upserts_succeeded_total: Counter<u64>,
    pub upserts_failed_total: Counter<u64>,
}

impl Metrics {
    fn new(meter: Meter) -> Self {
        Self {
            misses_drained_total: meter
                .u64_counter("scion_xlat_misses_drained_total")
                .with_description("Path-cache miss keys drained off the miss ring")
                .build(),

            resolutions_succeeded_total: meter
                .u64_counter("scion_xlat_resolutions_succeeded_total")
                .with_description("Path resolutions that produced a cacheable entry")
                .build(),
            resolutions_failed_total: meter
                .u64_counter("scion_xlat_resolutions_failed_total")
                .with_description("Path resolutions that failed (sciond unreachable, no path, timeout)")
                .build(),

            upserts_succeeded_total: meter
                .u64_counter("scion_xlat_upserts_succeeded_total")
                .with_description("Successful writes into the path cache")
                .build(),
            upserts_failed_total: meter
                .u64_counter("scion_xlat_upserts_failed_total")
                .with_description("Failed writes into the path cache (map full or EBUSY)")
                .build(),
        }
    }
}

pub fn init_metrics() -> Result<(Arc<Metrics>, Registry), Box<dyn std::error::Error + Send + Sync>> {
    let registry = Registry::default();

    let exporter = opentelemetry_prometheus::exporter().with_registry(registry.clone()).build()?;

    let meter_provider = SdkMeterProvider::builder().with_reader(exporter).build();
    global::set_meter_provider(meter_provider);

    let meter = global::meter("scion-xlat");
    let metrics = Arc::new(Metrics::new(meter));

    Ok((metrics, registry))
}
