//! Routing module
//!
//! Provides exact-match routing:
//! - `RouteEntry` holds one handler per verb for a single endpoint
//! - `Router` owns the endpoint table and dispatches requests

mod entry;
mod router;

pub use entry::{Handler, RouteEntry, Verb};
pub use router::Router;
