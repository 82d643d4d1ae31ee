//! Minimal HTTP request router
//!
//! Maps a request's exact path and method to a registered handler and gives
//! handlers parsed query parameters plus `status`/`send`/`json` response helpers.
//!
//! ```no_run
//! use flux_router::{Config, Server};
//!
//! # async fn run() -> Result<(), flux_router::RouterError> {
//! let mut server = Server::new(Config::default());
//! server
//!     .route("/hello")
//!     .get(|_req, res| Ok(res.send("Hello World")?))
//!     .post(|req, res| Ok(res.json(req.query())?));
//!
//! server
//!     .start(3000, |addr| println!("server started on {addr}"))
//!     .await
//! # }
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod logger;
pub mod routing;
pub mod server;

pub use config::Config;
pub use error::{HandlerError, HandlerResult, RouterError};
pub use http::{Body, Request, Response};
pub use routing::{RouteEntry, Router, Verb};
pub use server::Server;
