use std::net::{IpAddr, Ipv6Addr, SocketAddr};

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Initializes metrics with an automatic HTTP server on the given port.
///
/// Installs the global metrics recorder and starts an HTTP server listening
/// on `[::]:{port}/metrics`, making metrics available for Prometheus
/// scraping. Must be called from within a tokio runtime, and at most once per
/// process since the recorder is global.
pub fn init_metrics(port: u16) -> Result<(), BuildError> {
    let addr = SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), port);

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;

    Ok(())
}
