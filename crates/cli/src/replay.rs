//! Offline replay of recorded events through the gated pipeline.
//!
//! Input is NDJSON, one [`InboundEvent`] per line. Lines that are not UTF-8
//! or do not parse are logged and skipped; a failing handler only affects its
//! own event.

use crate::sink::JsonStreamSink;
use std::io::{BufRead, ErrorKind, Write};
use std::sync::Arc;
use warden_core::error::{WardenError, WardenResult};
use warden_gate::handlers::{EchoHandler, HelpHandler};
use warden_gate::{AdmissionGate, Dispatcher, Event, Flow, InboundEvent, Router};
use warden_store::MembershipStore;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplayStats {
    pub handled: usize,
    pub unhandled: usize,
    pub rejected: usize,
    pub failed: usize,
    pub malformed: usize,
}

/// Gate in front of the built-in command handlers.
pub fn build_dispatcher(
    store: Arc<MembershipStore>,
    denied_text: Option<String>,
) -> Dispatcher<InboundEvent> {
    let mut gate = AdmissionGate::new(store);
    if let Some(text) = denied_text {
        gate = gate.with_denied_text(text);
    }
    let router = Router::new().handler(HelpHandler).handler(EchoHandler);
    tracing::debug!(
        handlers = router.len(),
        denied_text = gate.denied_text(),
        "pipeline ready"
    );
    Dispatcher::new(router).middleware(gate)
}

pub async fn replay<R: BufRead, W: Write>(
    dispatcher: &Dispatcher<InboundEvent>,
    input: R,
    sink: &mut JsonStreamSink<W>,
) -> WardenResult<ReplayStats> {
    let mut stats = ReplayStats::default();

    for (idx, line) in input.lines().enumerate() {
        let lineno = idx + 1;
        let line = match line {
            Ok(line) => line,
            // The bad line is already consumed; the reader resumes at the next one.
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                tracing::warn!(line = lineno, error = %e, "skipping unreadable line");
                stats.malformed += 1;
                continue;
            }
            Err(e) => return Err(WardenError::InvalidInput(format!("line {lineno}: {e}"))),
        };
        if line.trim().is_empty() {
            continue;
        }

        let event = match InboundEvent::from_json(&line) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(line = lineno, error = %e, "skipping malformed event");
                stats.malformed += 1;
                continue;
            }
        };

        match dispatcher.dispatch(&event).await {
            Ok(Flow::Handled) => stats.handled += 1,
            Ok(Flow::Unhandled) => stats.unhandled += 1,
            Ok(Flow::Rejected) => stats.rejected += 1,
            Err(_) => stats.failed += 1,
        }

        let actor = event.actor().ok().flatten().map(|id| id.get());
        sink.write_notices(lineno, event.chat_id, actor, &event.take_notices())
            .map_err(|e| WardenError::Delivery(format!("cannot write reply: {e}")))?;
    }

    Ok(stats)
}
