//! Route entry module
//!
//! One `RouteEntry` per endpoint, holding at most one handler per supported verb.

use crate::error::HandlerResult;
use crate::http::{Request, Response};
use crate::logger;
use std::fmt;
use std::sync::Arc;

/// Methods a handler can be registered for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Post,
    Put,
    Delete,
}

impl Verb {
    pub const ALL: [Self; 4] = [Self::Get, Self::Post, Self::Put, Self::Delete];

    /// Case-insensitive lookup; `None` for methods without a handler slot
    pub fn from_method(method: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|verb| verb.as_str().eq_ignore_ascii_case(method))
    }

    /// Lowercase slot key
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Post => "post",
            Self::Put => "put",
            Self::Delete => "delete",
        }
    }

    const fn slot(self) -> usize {
        match self {
            Self::Get => 0,
            Self::Post => 1,
            Self::Put => 2,
            Self::Delete => 3,
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Application handler, shared read-only across connections
pub type Handler = Arc<dyn Fn(&Request, &mut Response) -> HandlerResult + Send + Sync>;

/// Handlers registered for one exact endpoint string
pub struct RouteEntry {
    endpoint: String,
    handlers: [Option<Handler>; 4],
}

impl RouteEntry {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            handlers: Default::default(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Store `handler` in the slot for `verb`. An existing handler is replaced.
    pub fn register<F>(&mut self, verb: Verb, handler: F) -> &mut Self
    where
        F: Fn(&Request, &mut Response) -> HandlerResult + Send + Sync + 'static,
    {
        let slot = &mut self.handlers[verb.slot()];
        if slot.is_some() {
            logger::log_handler_replaced(&self.endpoint, verb.as_str());
        }
        *slot = Some(Arc::new(handler));
        self
    }

    pub fn get<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(&Request, &mut Response) -> HandlerResult + Send + Sync + 'static,
    {
        self.register(Verb::Get, handler)
    }

    pub fn post<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(&Request, &mut Response) -> HandlerResult + Send + Sync + 'static,
    {
        self.register(Verb::Post, handler)
    }

    pub fn put<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(&Request, &mut Response) -> HandlerResult + Send + Sync + 'static,
    {
        self.register(Verb::Put, handler)
    }

    pub fn delete<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(&Request, &mut Response) -> HandlerResult + Send + Sync + 'static,
    {
        self.register(Verb::Delete, handler)
    }

    pub fn has_handler(&self, verb: Verb) -> bool {
        self.handlers[verb.slot()].is_some()
    }

    pub fn handler(&self, verb: Verb) -> Option<&Handler> {
        self.handlers[verb.slot()].as_ref()
    }

    /// Verbs with a registered handler
    pub fn verbs(&self) -> impl Iterator<Item = Verb> + '_ {
        Verb::ALL.into_iter().filter(|verb| self.has_handler(*verb))
    }
}

impl fmt::Debug for RouteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteEntry")
            .field("endpoint", &self.endpoint)
            .field("verbs", &self.verbs().collect::<Vec<_>>())
            .finish()
    }
}
