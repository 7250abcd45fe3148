//! Event pipeline and the admission gate that fronts it.
//!
//! Flow: event -> middlewares (gate first) -> router -> first matching handler.

pub mod dispatcher;
pub mod event;
pub mod gate;
pub mod handlers;
pub mod inbound;

pub use dispatcher::{Dispatcher, Flow, Handler, Middleware, Next, Router};
pub use event::{Event, EventKind, Notice, NoticeStyle};
pub use gate::{AdmissionGate, DEFAULT_DENIED_TEXT};
pub use inbound::InboundEvent;
