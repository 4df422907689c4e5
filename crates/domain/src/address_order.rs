use std::net::IpAddr;

/// Reorders resolver output according to the caller's family preference.
///
/// System resolvers return IPv6 addresses first. When IPv6 is not preferred
/// and the list runs from IPv6 at the front to IPv4 at the back, the whole
/// list is reversed. This is a plain reversal, so the order inside each
/// family is reversed too; peers depend on that exact order.
pub fn order_by_family(ips: &mut [IpAddr], prefer_ipv6: bool) -> bool {
    if prefer_ipv6 || ips.len() < 2 {
        return false;
    }

    let starts_with_v6 = !is_ipv4_like(&ips[0]);
    let ends_with_v4 = is_ipv4_like(&ips[ips.len() - 1]);
    if starts_with_v6 && ends_with_v4 {
        ips.reverse();
        return true;
    }
    false
}

/// IPv4, or IPv6 that is an IPv4-mapped address.
pub fn is_ipv4_like(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(_) => true,
        IpAddr::V6(v6) => v6.to_ipv4_mapped().is_some(),
    }
}
