//! HTTP layer module
//!
//! Request augmentation (path and query parsing) and the response state machine
//! handed to handlers, plus conversion to hyper types for the wire.

pub mod request;
pub mod response;

pub use request::{parse_target, Request};
pub use response::{build_400_response, build_413_response, Body, Response};
