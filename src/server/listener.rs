use std::io;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, error, warn};

use crate::content::resolver::Resolver;
use crate::http::connection::Connection;
use crate::server::pool::WorkerPool;

/// Pause after a failed `accept`, so persistent failures (EMFILE) do not spin.
pub const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Accepts connections until `shutdown` fires or its sender is dropped,
/// then drops the listener.
///
/// A failed `accept` is logged, followed by a short pause, and the loop
/// carries on. Each connection is handed to `pool`; its errors are logged
/// inside the task and never reach this loop.
pub async fn run(
    listener: TcpListener,
    resolver: Arc<Resolver>,
    pool: WorkerPool,
    read_timeout: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((socket, peer)) => {
                    debug!("Accepted connection from {}", peer);

                    let resolver = resolver.clone();
                    pool.dispatch(async move {
                        let mut conn = Connection::new(socket, peer.to_string(), resolver, read_timeout);
                        if let Err(e) = conn.run().await {
                            error!("Connection error from {}: {}", peer, e);
                        }
                    });
                }
                Err(e) => {
                    tokio::select! {
                        _ = accept_backoff(&e) => {}
                        _ = shutdown.changed() => break,
                    }
                }
            },

            _ = shutdown.changed() => {
                break;
            }
        }
    }

    debug!(in_flight = pool.in_flight(), "Accept loop finished");
}

/// Logs a failed `accept` and waits [`ACCEPT_ERROR_BACKOFF`].
pub async fn accept_backoff(e: &io::Error) {
    warn!(error = %e, backoff = ?ACCEPT_ERROR_BACKOFF, "Failed to accept connection");
    tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn accept_error_pauses_the_loop() {
        let err = io::Error::from_raw_os_error(24);
        let started = Instant::now();

        accept_backoff(&err).await;

        assert!(started.elapsed() >= ACCEPT_ERROR_BACKOFF);
    }
}
