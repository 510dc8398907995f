//! Resolves `host:port` and picks the first address that accepts a
//! connection.
use std::net::{Ipv6Addr, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::args::TargetSpec;
use crate::error::TargetError;

/// Address every query connects to, plus the `Host:` header value. IPv6
/// literals keep their brackets there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub addr: SocketAddr,
    pub host: String,
}

/// Resolves `wanted` and probes each address in order with a blocking connect
/// bounded by `probe_timeout`.
///
/// # Errors
///
/// Returns an error when resolution fails, yields nothing, or no address
/// accepts a connection.
pub fn resolve_target(
    wanted: &TargetSpec,
    probe_timeout: Duration,
) -> Result<ResolvedTarget, TargetError> {
    let addrs: Vec<SocketAddr> = (wanted.host.as_str(), wanted.port)
        .to_socket_addrs()
        .map_err(|err| TargetError::Resolve {
            host: wanted.host.clone(),
            port: wanted.port,
            source: err,
        })?
        .collect();
    if addrs.is_empty() {
        return Err(TargetError::NoAddressesResolved {
            host: wanted.host.clone(),
        });
    }
    debug!("{} resolved to {:?}", wanted, addrs);

    for addr in &addrs {
        match TcpStream::connect_timeout(addr, probe_timeout) {
            Ok(_probe) => {
                info!("Target {} reachable at {}", wanted, addr);
                return Ok(ResolvedTarget {
                    addr: *addr,
                    host: host_header(&wanted.host),
                });
            }
            Err(err) => warn!("Probe of {} failed: {}", addr, err),
        }
    }
    Err(TargetError::Unreachable {
        host: wanted.host.clone(),
        attempted: addrs,
    })
}

fn host_header(host: &str) -> String {
    if host.parse::<Ipv6Addr>().is_ok() {
        format!("[{}]", host)
    } else {
        host.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn probes_listening_address() -> Result<(), String> {
        let listener = TcpListener::bind("127.0.0.1:0").map_err(|err| err.to_string())?;
        let port = listener.local_addr().map_err(|err| err.to_string())?.port();
        let spec = TargetSpec {
            host: "127.0.0.1".to_owned(),
            port,
        };
        let target =
            resolve_target(&spec, Duration::from_secs(2)).map_err(|err| err.to_string())?;
        if target.addr.port() != port || target.host != "127.0.0.1" {
            return Err(format!("Unexpected target: {:?}", target));
        }
        Ok(())
    }

    #[test]
    fn ipv6_literal_host_is_bracketed() -> Result<(), String> {
        for (host, expected) in [
            ("::1", "[::1]"),
            ("fe80::2", "[fe80::2]"),
            ("127.0.0.1", "127.0.0.1"),
            ("example.com", "example.com"),
        ] {
            if host_header(host) != expected {
                return Err(format!("{} rendered as {}", host, host_header(host)));
            }
        }
        Ok(())
    }

    #[test]
    fn closed_port_is_unreachable() -> Result<(), String> {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").map_err(|err| err.to_string())?;
            listener.local_addr().map_err(|err| err.to_string())?.port()
        };
        let spec = TargetSpec {
            host: "127.0.0.1".to_owned(),
            port,
        };
        match resolve_target(&spec, Duration::from_millis(500)) {
            Err(TargetError::Unreachable { attempted, .. }) if attempted.len() == 1 => Ok(()),
            Err(other) => Err(format!("Unexpected error: {}", other)),
            Ok(target) => Err(format!("Expected failure, got {:?}", target)),
        }
    }
}
