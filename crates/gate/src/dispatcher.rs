//! Handler routing and middleware chaining.

use crate::event::Event;
use async_trait::async_trait;
use std::sync::Arc;
use warden_core::error::WardenResult;

/// How far an event travelled through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// A handler consumed the event.
    Handled,
    /// Admitted, but no handler matched.
    Unhandled,
    /// Stopped by a middleware before reaching any handler.
    Rejected,
}

/// Business logic for one family of events.
#[async_trait]
pub trait Handler<E: Event>: Send + Sync {
    /// Returns [`Flow::Unhandled`] to let the next handler try.
    async fn handle(&self, event: &E) -> WardenResult<Flow>;
}

/// Wraps everything after it in the pipeline.
#[async_trait]
pub trait Middleware<E: Event>: Send + Sync {
    /// Call `next.run(event)` to forward; return without calling it to stop
    /// propagation.
    async fn call(&self, event: &E, next: Next<'_, E>) -> WardenResult<Flow>;
}

/// Remainder of the pipeline as seen from inside a middleware.
pub struct Next<'a, E: Event> {
    middlewares: &'a [Arc<dyn Middleware<E>>],
    router: &'a Router<E>,
}

impl<'a, E: Event> Next<'a, E> {
    pub async fn run(self, event: &E) -> WardenResult<Flow> {
        match self.middlewares.split_first() {
            Some((head, rest)) => {
                let next = Next {
                    middlewares: rest,
                    router: self.router,
                };
                head.call(event, next).await
            }
            None => self.router.route(event).await,
        }
    }
}

/// Ordered handlers; the first one that handles an event wins.
pub struct Router<E: Event> {
    handlers: Vec<Arc<dyn Handler<E>>>,
}

impl<E: Event> Default for Router<E> {
    fn default() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }
}

impl<E: Event> Router<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handler(mut self, handler: impl Handler<E> + 'static) -> Self {
        self.handlers.push(Arc::new(handler));
        self
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub async fn route(&self, event: &E) -> WardenResult<Flow> {
        for handler in &self.handlers {
            match handler.handle(event).await? {
                Flow::Unhandled => continue,
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Unhandled)
    }
}

/// Entry point for inbound events: middlewares in registration order, then
/// the router.
pub struct Dispatcher<E: Event> {
    middlewares: Vec<Arc<dyn Middleware<E>>>,
    router: Router<E>,
}

impl<E: Event> Dispatcher<E> {
    pub fn new(router: Router<E>) -> Self {
        Self {
            middlewares: Vec::new(),
            router,
        }
    }

    /// Registers an outer middleware. The first registered runs first.
    pub fn middleware(mut self, middleware: impl Middleware<E> + 'static) -> Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    /// Runs one event through the pipeline.
    ///
    /// Errors are scoped to this event; the dispatcher stays usable.
    pub async fn dispatch(&self, event: &E) -> WardenResult<Flow> {
        let next = Next {
            middlewares: &self.middlewares,
            router: &self.router,
        };
        let flow = next.run(event).await;
        match &flow {
            Ok(flow) => tracing::debug!(kind = ?event.kind(), ?flow, "event dispatched"),
            Err(e) => tracing::warn!(kind = ?event.kind(), error = %e, "event failed"),
        }
        flow
    }
}
