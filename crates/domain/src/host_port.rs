use crate::DialError;

/// Splits `host:port`, `[ipv6]:port` or `[ipv6%zone]:port` into its host and
/// port tokens. Brackets are stripped from the host; the port token is
/// returned as written (it may be a service name).
pub fn split_host_port(address: &str) -> Result<(&str, &str), DialError> {
    let malformed = |reason: &str| DialError::AddressMalformed {
        address: address.to_string(),
        reason: reason.to_string(),
    };

    let colon = address
        .rfind(':')
        .ok_or_else(|| malformed("missing port in address"))?;

    let (host, host_start, host_end) = if let Some(rest) = address.strip_prefix('[') {
        let end = rest
            .find(']')
            .map(|i| i + 1)
            .ok_or_else(|| malformed("missing ']' in address"))?;
        match address.as_bytes().get(end + 1) {
            None => return Err(malformed("missing port in address")),
            Some(b':') if end + 1 == colon => {}
            Some(b':') => return Err(malformed("too many colons in address")),
            Some(b']') => return Err(malformed("unexpected ']' in address")),
            Some(_) => return Err(malformed("missing port in address")),
        }
        (&address[1..end], 1, end + 1)
    } else {
        let host = &address[..colon];
        if host.contains(':') {
            return Err(malformed("too many colons in address"));
        }
        (host, 0, 0)
    };

    if address[host_start..].contains('[') {
        return Err(malformed("unexpected '[' in address"));
    }
    if address[host_end..].contains(']') {
        return Err(malformed("unexpected ']' in address"));
    }

    Ok((host, &address[colon + 1..]))
}
