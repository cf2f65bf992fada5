//! TCP listener binding.

use std::net::SocketAddr;

use tokio::net::TcpListener;

/// Error type for listener operations.
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    /// Failed to bind to address.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Failed to read back the bound address.
    #[error("failed to read local address: {0}")]
    LocalAddr(#[source] std::io::Error),
}

/// A bound listener together with the address the OS gave it.
#[derive(Debug)]
pub struct Bound {
    pub listener: TcpListener,
    pub local_addr: SocketAddr,
}

/// Bind `addr`. Port `0` picks a free port; the actual one is in
/// [`Bound::local_addr`].
pub async fn bind(addr: SocketAddr) -> Result<Bound, ListenerError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ListenerError::Bind { addr, source })?;
    let local_addr = listener.local_addr().map_err(ListenerError::LocalAddr)?;

    tracing::debug!(address = %local_addr, "Listener bound");
    Ok(Bound {
        listener,
        local_addr,
    })
}
