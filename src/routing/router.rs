//! Request dispatch module
//!
//! Owns the endpoint table and resolves each request to a handler or to a fixed
//! 404/405/500 response.

use super::entry::{Handler, RouteEntry, Verb};
use crate::http::{Request, Response};
use crate::logger;
use hyper::body::Bytes;
use serde::Serialize;
use std::any::Any;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};

/// Body of the 500 response produced when a handler fails
#[derive(Serialize)]
struct InternalError<'a> {
    error: &'static str,
    message: &'a str,
}

/// How a handler invocation failed
enum Failure {
    Error(String),
    Panic(String),
}

/// Endpoint table. Mutable while routes are registered, then shared read-only
/// (behind an `Arc`) once serving starts.
#[derive(Debug, Default)]
pub struct Router {
    routes: HashMap<String, RouteEntry>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fresh entry for `endpoint` and return it for chaining.
    ///
    /// Registering the same endpoint again discards the previous entry's handlers.
    pub fn route(&mut self, endpoint: impl Into<String>) -> &mut RouteEntry {
        let endpoint = endpoint.into();
        let fresh = RouteEntry::new(endpoint.clone());
        match self.routes.entry(endpoint) {
            Entry::Occupied(mut occupied) => {
                logger::log_route_replaced(occupied.key());
                occupied.insert(fresh);
                occupied.into_mut()
            }
            Entry::Vacant(vacant) => {
                logger::log_route_registered(vacant.key());
                vacant.insert(fresh)
            }
        }
    }

    pub fn get_route(&self, endpoint: &str) -> Option<&RouteEntry> {
        self.routes.get(endpoint)
    }

    /// Registered endpoints, sorted
    pub fn endpoints(&self) -> Vec<&str> {
        let mut endpoints: Vec<&str> = self.routes.keys().map(String::as_str).collect();
        endpoints.sort_unstable();
        endpoints
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Resolve `req` and return a finalized response
    pub fn dispatch(&self, req: &Request) -> Response {
        let mut res = Response::new();

        // 1. Exact path lookup
        let Some(entry) = self.routes.get(req.pathname()) else {
            send_text(&mut res, 404, format!("404 Not Found: {}", req.url()));
            return res;
        };

        // 2. Handler for the method
        let Some(handler) = Verb::from_method(req.method()).and_then(|verb| entry.handler(verb))
        else {
            send_text(
                &mut res,
                405,
                format!("{} method not allowed/defined for {}", req.method(), req.url()),
            );
            return res;
        };

        // 3. Invoke, converting failures into a 500 unless already responded
        match invoke(handler, req, &mut res) {
            Ok(()) => {}
            Err(Failure::Error(message) | Failure::Panic(message)) if res.is_sent() => {
                logger::log_late_handler_error(req.method(), req.url(), &message);
            }
            Err(Failure::Error(message)) => {
                logger::log_handler_failed(req.method(), req.url(), &message);
                send_internal_error(&mut res, &message);
            }
            Err(Failure::Panic(message)) => {
                logger::log_handler_panicked(req.method(), req.url(), &message);
                send_internal_error(&mut res, &message);
            }
        }

        // 4. Handler returned without responding
        if !res.is_sent() {
            if let Err(e) = res.end(Bytes::new()) {
                let message = e.to_string();
                logger::log_handler_failed(req.method(), req.url(), &message);
                send_internal_error(&mut res, &message);
            }
        }

        res
    }
}

/// Run the handler, capturing both returned errors and panics.
///
/// A caught panic is still reported by the default panic hook on stderr,
/// outside the configured error log.
fn invoke(handler: &Handler, req: &Request, res: &mut Response) -> Result<(), Failure> {
    match panic::catch_unwind(AssertUnwindSafe(|| handler(req, res))) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(Failure::Error(e.to_string())),
        Err(payload) => Err(Failure::Panic(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "handler panicked".to_string())
}

fn send_text(res: &mut Response, status: u16, text: String) {
    if let Err(e) = res.status(status).send(text) {
        logger::log_error(&format!("Failed to send {status} response: {e}"));
    }
}

fn send_internal_error(res: &mut Response, message: &str) {
    let body = InternalError {
        error: "Internal Server Error",
        message,
    };
    if let Err(e) = res.status(500).json(&body) {
        logger::log_error(&format!("Failed to send 500 response: {e}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HandlerResult;
    use crate::http::response::{APPLICATION_JSON, TEXT_PLAIN};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn hello(_: &Request, res: &mut Response) -> HandlerResult {
        res.send("Hello World")?;
        Ok(())
    }

    #[test]
    fn test_dispatch_to_handler() {
        let mut router = Router::new();
        router.route("/hello").get(hello);

        let res = router.dispatch(&Request::new("GET", "/hello"));
        assert_eq!(res.status_code(), 200);
        assert_eq!(res.content_type(), Some(TEXT_PLAIN));
        assert_eq!(res.body_text(), "Hello World");
    }

    #[test]
    fn test_method_match_is_case_insensitive() {
        let mut router = Router::new();
        router.route("/hello").get(hello);

        let res = router.dispatch(&Request::new("get", "/hello"));
        assert_eq!(res.status_code(), 200);
    }

    #[test]
    fn test_unknown_path_is_404() {
        let mut router = Router::new();
        router.route("/hello").get(hello);

        for method in ["GET", "POST", "PATCH"] {
            let res = router.dispatch(&Request::new(method, "/missing?x=1"));
            assert_eq!(res.status_code(), 404);
            assert_eq!(res.content_type(), Some(TEXT_PLAIN));
            assert_eq!(res.body_text(), "404 Not Found: /missing?x=1");
        }
    }

    #[test]
    fn test_path_match_is_exact() {
        let mut router = Router::new();
        router.route("/hello").get(hello);

        assert_eq!(router.dispatch(&Request::new("GET", "/hello/")).status_code(), 404);
        assert_eq!(router.dispatch(&Request::new("GET", "/Hello")).status_code(), 404);
        assert_eq!(router.dispatch(&Request::new("GET", "/hello/x")).status_code(), 404);
    }

    #[test]
    fn test_unregistered_method_is_405() {
        let mut router = Router::new();
        router.route("/only-get").get(hello);

        let res = router.dispatch(&Request::new("POST", "/only-get?a=1"));
        assert_eq!(res.status_code(), 405);
        assert_eq!(res.content_type(), Some(TEXT_PLAIN));
        assert_eq!(
            res.body_text(),
            "POST method not allowed/defined for /only-get?a=1"
        );
    }

    #[test]
    fn test_unsupported_method_is_405() {
        let mut router = Router::new();
        router.route("/r").get(hello);

        let res = router.dispatch(&Request::new("PATCH", "/r"));
        assert_eq!(res.status_code(), 405);
        assert!(res.body_text().starts_with("PATCH "));
    }

    #[test]
    fn test_query_echoed_as_json() {
        let mut router = Router::new();
        router.route("/q").get(|req, res| Ok(res.json(req.query())?));

        let res = router.dispatch(&Request::new("GET", "/q?a=1&b=2"));
        assert_eq!(res.status_code(), 200);
        assert_eq!(res.content_type(), Some(APPLICATION_JSON));
        assert_eq!(res.body_text(), r#"{"a":"1","b":"2"}"#);
    }

    #[test]
    fn test_handler_error_is_500_json() {
        let mut router = Router::new();
        router.route("/boom").get(|_, _| Err("boom".into()));

        let res = router.dispatch(&Request::new("GET", "/boom"));
        assert_eq!(res.status_code(), 500);
        assert_eq!(res.content_type(), Some(APPLICATION_JSON));
        assert_eq!(
            res.body_text(),
            r#"{"error":"Internal Server Error","message":"boom"}"#
        );
    }

    #[test]
    fn test_handler_panic_is_500_json() {
        let mut router = Router::new();
        router.route("/panic").get(|_, _| panic!("kaboom"));

        let res = router.dispatch(&Request::new("GET", "/panic"));
        assert_eq!(res.status_code(), 500);
        let body: serde_json::Value = serde_json::from_str(res.body_text()).unwrap();
        assert_eq!(body, json!({"error": "Internal Server Error", "message": "kaboom"}));
    }

    #[test]
    fn test_error_after_send_keeps_response() {
        let mut router = Router::new();
        router.route("/late").get(|_, res| {
            res.status(201).send("done")?;
            Err("too late".into())
        });

        let res = router.dispatch(&Request::new("GET", "/late"));
        assert_eq!(res.status_code(), 201);
        assert_eq!(res.body_text(), "done");
    }

    #[test]
    fn test_status_after_send_does_not_reach_wire() {
        let mut router = Router::new();
        router.route("/sent").get(|_, res| {
            res.send("ok")?;
            res.status(418).set_header("X-After", "1");
            Ok(())
        });

        let res = router.dispatch(&Request::new("GET", "/sent"));
        assert_eq!(res.status_code(), 200);

        let wire = res.into_hyper();
        assert_eq!(wire.status(), 200);
        assert!(wire.headers().get("x-after").is_none());
    }

    #[test]
    fn test_double_send_keeps_first_body() {
        let mut router = Router::new();
        router.route("/twice").get(|_, res| {
            res.send("first")?;
            res.send("second")?;
            Ok(())
        });

        let res = router.dispatch(&Request::new("GET", "/twice"));
        assert_eq!(res.status_code(), 200);
        assert_eq!(res.body_text(), "first");
    }

    #[test]
    fn test_handler_without_response_is_empty() {
        let mut router = Router::new();
        router.route("/silent").delete(|_, res| {
            res.status(204);
            Ok(())
        });

        let res = router.dispatch(&Request::new("DELETE", "/silent"));
        assert_eq!(res.status_code(), 204);
        assert!(res.is_sent());
        assert_eq!(res.content_type(), None);
        assert_eq!(res.body_text(), "");
    }

    #[test]
    fn test_invalid_status_is_500() {
        let mut router = Router::new();
        router.route("/bad").get(|_, res| Ok(res.status(1000).send("x")?));

        let res = router.dispatch(&Request::new("GET", "/bad"));
        assert_eq!(res.status_code(), 500);
        assert!(res.body_text().contains("invalid status code: 1000"));
    }

    #[test]
    fn test_status_chaining() {
        let mut router = Router::new();
        router
            .route("/created")
            .post(|_, res| Ok(res.status(201).send("ok")?))
            .put(|_, res| Ok(res.status(201).json(&json!({"x": 1}))?));

        let res = router.dispatch(&Request::new("POST", "/created"));
        assert_eq!(res.status_code(), 201);
        assert_eq!(res.content_type(), Some(TEXT_PLAIN));
        assert_eq!(res.body_text(), "ok");

        let res = router.dispatch(&Request::new("PUT", "/created"));
        assert_eq!(res.status_code(), 201);
        assert_eq!(res.content_type(), Some(APPLICATION_JSON));
        assert_eq!(res.body_text(), r#"{"x":1}"#);
    }

    #[test]
    fn test_last_registration_wins() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let mut router = Router::new();
        let counter = Arc::clone(&first);
        router.route("/e").get(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        let counter = Arc::clone(&second);
        router.route("/e").get(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        router.dispatch(&Request::new("GET", "/e"));
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_reregistering_endpoint_discards_other_verbs() {
        let mut router = Router::new();
        router.route("/e").get(hello).post(hello);
        router.route("/e").get(hello);

        assert_eq!(router.len(), 1);
        let res = router.dispatch(&Request::new("POST", "/e"));
        assert_eq!(res.status_code(), 405);
    }

    #[test]
    fn test_identical_registration_is_idempotent() {
        let mut once = Router::new();
        once.route("/i").get(hello);

        let mut twice = Router::new();
        twice.route("/i").get(hello);
        twice.route("/i").get(hello);

        for req in [Request::new("GET", "/i"), Request::new("POST", "/i")] {
            let a = once.dispatch(&req);
            let b = twice.dispatch(&req);
            assert_eq!(a.status_code(), b.status_code());
            assert_eq!(a.content_type(), b.content_type());
            assert_eq!(a.body_text(), b.body_text());
        }
    }

    #[test]
    fn test_endpoints_sorted() {
        let mut router = Router::new();
        assert!(router.is_empty());
        router.route("/b");
        router.route("/a");
        assert_eq!(router.endpoints(), vec!["/a", "/b"]);
        assert!(router.get_route("/a").is_some());
        assert!(router.get_route("/c").is_none());
    }
}
