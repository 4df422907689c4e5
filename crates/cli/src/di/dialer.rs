use std::sync::Arc;
use tracing::info;
use tunnel_dialer_application::ports::SocketProtector;
use tunnel_dialer_application::services::AddressResolver;
use tunnel_dialer_application::use_cases::ProtectedDialer;
use tunnel_dialer_domain::DialerConfig;
use tunnel_dialer_infrastructure::{
    AllowAllProtector, FwmarkProtector, ProtectedConnector, SystemHostLookup,
};

pub fn build_dialer(config: &DialerConfig) -> ProtectedDialer {
    let protector: Arc<dyn SocketProtector> = match config.fwmark {
        Some(mark) => {
            info!(mark, "Protecting sockets with fwmark");
            Arc::new(FwmarkProtector::new(mark))
        }
        None => Arc::new(AllowAllProtector),
    };

    let resolver = AddressResolver::new(Arc::new(SystemHostLookup::new()))
        .with_timeout(config.resolve_timeout());
    let connector = Arc::new(ProtectedConnector::new(protector));

    ProtectedDialer::new(resolver, connector)
        .with_retry_policy(config.max_resolve_attempts, config.retry_interval())
        .with_rotation_throttle(config.rotation_throttle())
}
