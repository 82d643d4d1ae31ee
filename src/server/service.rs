// Request service module
// Turns one hyper request into a dispatched response

use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Bytes, Incoming};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use super::ServerState;
use crate::http::{build_400_response, build_413_response, Request};
use crate::logger::{self, AccessLogEntry};

/// Entry point for every request on every connection
pub async fn handle_request(
    req: hyper::Request<Incoming>,
    peer_addr: SocketAddr,
    state: Arc<ServerState>,
) -> Result<hyper::Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let max_body_size = state.config.http.max_body_size;

    // 1. Reject oversized bodies announced up front
    if let Some(resp) = check_body_size(&req, max_body_size) {
        return Ok(resp);
    }

    // 2. Collect the body, bounded for chunked uploads
    let (parts, body) = req.into_parts();
    let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);
    let body = match Limited::new(body, limit).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            logger::log_error(&format!("Request body exceeded {max_body_size} bytes"));
            return Ok(build_413_response());
        }
        Err(e) => {
            logger::log_warning(&format!("Failed to read request body: {e}"));
            return Ok(build_400_response());
        }
    };

    // 3. Augment and dispatch
    let request = Request::from_parts(&parts, body);
    let response = state.router.dispatch(&request);

    if state.config.logging.access_log {
        let mut entry = AccessLogEntry::new(
            peer_addr.to_string(),
            request.method().to_string(),
            request.url().to_string(),
        );
        entry.status = response.status_code();
        entry.body_bytes = response.body().map_or(0, Bytes::len);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response.into_hyper())
}

/// Validate Content-Length header against max body size
/// Returns Some(413 response) if too large, None otherwise
fn check_body_size(
    req: &hyper::Request<Incoming>,
    max_body_size: u64,
) -> Option<hyper::Response<Full<Bytes>>> {
    let content_length = req.headers().get("content-length")?;
    content_length.to_str().map_or_else(
        |_| {
            logger::log_warning("Content-Length header contains non-ASCII characters");
            None
        },
        |size_str| match size_str.parse::<u64>() {
            Ok(size) if size > max_body_size => {
                logger::log_error(&format!(
                    "Request body too large: {size} bytes (max: {max_body_size})"
                ));
                Some(build_413_response())
            }
            Err(_) => {
                logger::log_warning(&format!(
                    "Invalid Content-Length value: '{size_str}', skipping size check"
                ));
                None
            }
            _ => None,
        },
    )
}
