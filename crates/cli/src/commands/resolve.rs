use std::sync::Arc;
use tunnel_dialer_application::services::AddressResolver;
use tunnel_dialer_domain::DialerConfig;
use tunnel_dialer_infrastructure::SystemHostLookup;

/// Prints the server's addresses in the order failover will try them.
pub async fn run_resolve(address: &str, config: &DialerConfig) -> anyhow::Result<()> {
    let resolver = AddressResolver::new(Arc::new(SystemHostLookup::new()))
        .with_timeout(config.resolve_timeout());

    let endpoint = resolver.resolve(address, config.prefer_ipv6).await?;

    println!("{} port {}", endpoint.hostname(), endpoint.port());
    for ip in endpoint.ips() {
        println!("  {}", ip);
    }
    Ok(())
}
