use lazy_static::lazy_static;
use prometheus::Counter;
use prometheus::CounterVec;
use prometheus::Opts;
use prometheus::Registry;
use slog::debug;
use slog::Logger;

lazy_static! {
    pub static ref DISCOVERY_ERRORS: CounterVec = CounterVec::new(
        Opts::new(
            "gateway_ha_discovery_errors",
            "Number of candidate URL refreshes that failed"
        ),
        &["service"]
    )
    .expect("Failed to create DISCOVERY_ERRORS counter");
    pub static ref DISCOVERY_TOTAL: CounterVec = CounterVec::new(
        Opts::new(
            "gateway_ha_discovery_total",
            "Number of candidate URL refreshes against the coordination service"
        ),
        &["service"]
    )
    .expect("Failed to create DISCOVERY_TOTAL counter");
    pub static ref FAILOVER_TOTAL: CounterVec = CounterVec::new(
        Opts::new(
            "gateway_ha_failover_total",
            "Number of active URL changes caused by reported failures"
        ),
        &["service"]
    )
    .expect("Failed to create FAILOVER_TOTAL counter");
    pub static ref ZOO_CONNECTION_COUNT: Counter = Counter::new(
        "gateway_ha_zookeeper_connect",
        "Number of connections to the zookeeper ensemble since the process started"
    )
    .expect("Failed to create ZOO_CONNECTION_COUNT counter");
}

/// Attempts to register metrics with the Registry.
///
/// Metrics that fail to register are logged and ignored.
pub fn register_metrics(logger: &Logger, registry: &Registry) {
    if let Err(err) = registry.register(Box::new(DISCOVERY_ERRORS.clone())) {
        debug!(logger, "Failed to register DISCOVERY_ERRORS"; "error" => ?err);
    }
    if let Err(err) = registry.register(Box::new(DISCOVERY_TOTAL.clone())) {
        debug!(logger, "Failed to register DISCOVERY_TOTAL"; "error" => ?err);
    }
    if let Err(err) = registry.register(Box::new(FAILOVER_TOTAL.clone())) {
        debug!(logger, "Failed to register FAILOVER_TOTAL"; "error" => ?err);
    }
    if let Err(err) = registry.register(Box::new(ZOO_CONNECTION_COUNT.clone())) {
        debug!(logger, "Failed to register ZOO_CONNECTION_COUNT"; "error" => ?err);
    }
}
