// Server loop module
// Accepts connections until the shutdown future resolves

use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

use super::connection::accept_connection;
use super::ServerState;
use crate::logger;

/// Accept connections from `listener` and hand each one to its own task.
///
/// Returns once `shutdown` completes; connections already accepted keep running
/// in the background until they finish or time out.
pub async fn run_accept_loop<S>(listener: TcpListener, state: Arc<ServerState>, shutdown: S)
where
    S: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => accept_connection(stream, peer_addr, &state),
                    Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
                }
            }

            () = &mut shutdown => break,
        }
    }
}
