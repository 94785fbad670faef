use admin_services::prelude::*;
use dispatch_core::prelude::*;
use dispatch_test_support::*;
use std::sync::Arc;
use std::time::Duration;

pub const BASE: &str = "https://admin.local/api";

#[allow(unused)]
pub fn config() -> ServiceConfig {
    ServiceConfig::builder("admin", BASE).build().unwrap()
}

#[allow(unused)]
pub fn config_with_timeout(timeout: Duration) -> ServiceConfig {
    ServiceConfig::builder("admin", BASE)
        .timeout(timeout)
        .build()
        .unwrap()
}

#[allow(unused)]
pub fn relay_of(r: &Arc<MockRelay>) -> Option<Arc<dyn RelayChannel>> {
    Some(r.clone() as Arc<dyn RelayChannel>)
}

#[allow(unused)]
pub fn services(
    transport: MockTransport,
    relay: Option<Arc<dyn RelayChannel>>,
) -> AdminServices<MockTransport> {
    AdminServices::with_transport(config(), transport, relay)
}

#[allow(unused)]
pub fn client(
    cfg: ServiceConfig,
    transport: MockTransport,
    relay: Option<Arc<dyn RelayChannel>>,
) -> ApiClient<MockTransport> {
    let c = ApiClient::with_transport(cfg, transport);
    match relay {
        Some(r) => c.with_relay(r),
        None => c,
    }
}
