// Server module entry point
// Binds the listener, runs the accept loop and serves connections with a finalized router

pub mod connection;
pub mod listener;
pub mod service;
pub mod signal;

// `loop` is a keyword, so the file is mounted under another name
#[path = "loop.rs"]
pub mod server_loop;

pub use listener::create_reusable_listener;
pub use server_loop::run_accept_loop;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::Config;
use crate::error::RouterError;
use crate::logger;
use crate::routing::{RouteEntry, Router};

/// State shared by every connection once serving has started
pub struct ServerState {
    /// Route table, read-only from here on
    pub router: Router,
    pub config: Config,
    pub active_connections: AtomicUsize,
}

/// Application entry: collect routes, then start serving
pub struct Server {
    router: Router,
    config: Config,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self::with_router(config, Router::new())
    }

    pub const fn with_router(config: Config, router: Router) -> Self {
        Self { router, config }
    }

    /// Register `endpoint`; see [`Router::route`]
    pub fn route(&mut self, endpoint: impl Into<String>) -> &mut RouteEntry {
        self.router.route(endpoint)
    }

    pub const fn router(&self) -> &Router {
        &self.router
    }

    pub fn router_mut(&mut self) -> &mut Router {
        &mut self.router
    }

    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Bind `host:port` from the config, call `on_ready` with the bound address,
    /// and serve until Ctrl+C or SIGTERM.
    ///
    /// Consumes the server: no route can be registered once dispatch begins.
    pub async fn start<F>(self, port: u16, on_ready: F) -> Result<(), RouterError>
    where
        F: FnOnce(SocketAddr),
    {
        let addr = self.config.socket_addr(port)?;
        let listener = create_reusable_listener(addr)?;
        self.serve(listener, on_ready, signal::shutdown_signal()).await
    }

    /// Serve from an already bound listener until `shutdown` resolves
    pub async fn serve<F, S>(
        self,
        listener: TcpListener,
        on_ready: F,
        shutdown: S,
    ) -> Result<(), RouterError>
    where
        F: FnOnce(SocketAddr),
        S: Future<Output = ()>,
    {
        let addr = listener.local_addr()?;
        let state = Arc::new(ServerState {
            router: self.router,
            config: self.config,
            active_connections: AtomicUsize::new(0),
        });

        logger::log_server_start(&addr, &state.config, state.router.len());
        on_ready(addr);

        run_accept_loop(listener, state, shutdown).await;
        logger::log_server_shutdown(&addr);
        Ok(())
    }
}
