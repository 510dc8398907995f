use std::net::SocketAddr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TargetError {
    #[error("Failed to resolve {host}:{port} ({source})")]
    Resolve {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },
    #[error("No addresses resolved for {host}.")]
    NoAddressesResolved { host: String },
    #[error("None of the addresses for {host} accepted a connection (tried {attempted:?}).")]
    Unreachable {
        host: String,
        attempted: Vec<SocketAddr>,
    },
}
