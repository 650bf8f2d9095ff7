//! Listen address parsing.

use std::net::{IpAddr, Ipv4Addr, SocketAddr, ToSocketAddrs};

use anyhow::Context;

pub const DEFAULT_ADDRESS: &str = "127.0.0.1:3000";

/// Resolve a listen address.
///
/// Accepts `host:port`, `:port` (all interfaces) and a bare `port`
/// (loopback only).
pub fn resolve_address(address: &str) -> Result<SocketAddr, anyhow::Error> {
    let address = address.trim();

    if let Ok(port) = address.parse::<u16>() {
        return Ok(SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port));
    }

    if let Some(port) = address.strip_prefix(':') {
        let port: u16 = port
            .parse()
            .with_context(|| format!("invalid port in listen address '{address}'"))?;
        return Ok(SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port));
    }

    if let Ok(addr) = address.parse::<SocketAddr>() {
        return Ok(addr);
    }

    address
        .to_socket_addrs()
        .with_context(|| format!("invalid listen address '{address}'"))?
        .next()
        .ok_or_else(|| anyhow::anyhow!("listen address '{address}' did not resolve"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_address() {
        let addr = resolve_address(DEFAULT_ADDRESS).unwrap();
        assert_eq!(addr, "127.0.0.1:3000".parse().unwrap());
    }

    #[test]
    fn test_bare_port_binds_loopback() {
        let addr = resolve_address("3000").unwrap();
        assert_eq!(addr, "127.0.0.1:3000".parse().unwrap());
    }

    #[test]
    fn test_colon_port_binds_all_interfaces() {
        let addr = resolve_address(":8080").unwrap();
        assert_eq!(addr, "0.0.0.0:8080".parse().unwrap());
    }

    #[test]
    fn test_ipv6() {
        let addr = resolve_address("[::1]:3000").unwrap();
        assert!(addr.is_ipv6());
    }

    #[test]
    fn test_localhost_resolves() {
        let addr = resolve_address("localhost:3000").unwrap();
        assert_eq!(addr.port(), 3000);
        assert!(addr.ip().is_loopback());
    }

    #[test]
    fn test_invalid() {
        assert!(resolve_address("nope").is_err());
        assert!(resolve_address(":99999").is_err());
    }
}
