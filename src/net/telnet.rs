mod connection;

use crate::config::Config;
use crate::error::{InfraError, InfraResult};
use crate::net::telnet::connection::handle_connection;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::net::TcpListener;
use tracing::Instrument;

/// Id of the next console connection; also counts connections.
static NEXT_CONSOLE_ID: AtomicU64 = AtomicU64::new(1);

/// Run the telnet console on `addr`.
pub async fn serve(addr: std::net::SocketAddr, cfg: Arc<Config>) -> InfraResult<()> {
    let listener = TcpListener::bind(&addr).await.map_err(InfraError::from)?;
    serve_listener(listener, cfg).await
}

/// Accept console clients on an already bound listener. Each client gets its
/// own editing session.
pub async fn serve_listener(listener: TcpListener, cfg: Arc<Config>) -> InfraResult<()> {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                let id = NEXT_CONSOLE_ID.fetch_add(1, Ordering::Relaxed);
                let span = tracing::info_span!("console", id, %peer);
                let cfg = cfg.clone();

                tokio::spawn(
                    async move {
                        tracing::info!("client connected");
                        if let Err(e) = handle_connection(stream, cfg).await {
                            tracing::error!(error=%e, "connection error");
                        }
                        tracing::info!("client disconnected");
                    }
                    .instrument(span),
                );
            }
            Err(e) => {
                tracing::error!(error=%e, "failed to accept connection");
                tokio::time::sleep(std::time::Duration::from_millis(200)).await;
            }
        }
    }
}
