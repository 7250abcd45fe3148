//! Admission gate middleware.
//!
//! Sits in front of every handler. Admitted events pass through untouched;
//! rejected ones get exactly one "access restricted" notice and go no further.
//! The gate only reads the store.

use crate::dispatcher::{Flow, Middleware, Next};
use crate::event::{Event, EventKind, Notice};
use async_trait::async_trait;
use std::sync::Arc;
use warden_core::error::WardenResult;
use warden_core::{Decision, Identity};
use warden_store::MembershipStore;

pub const DEFAULT_DENIED_TEXT: &str = "Access restricted. Please contact an administrator.";

pub struct AdmissionGate {
    store: Arc<MembershipStore>,
    denied_text: String,
}

impl AdmissionGate {
    pub fn new(store: Arc<MembershipStore>) -> Self {
        Self {
            store,
            denied_text: DEFAULT_DENIED_TEXT.to_string(),
        }
    }

    pub fn with_denied_text(mut self, text: impl Into<String>) -> Self {
        self.denied_text = text.into();
        self
    }

    pub fn denied_text(&self) -> &str {
        &self.denied_text
    }

    /// Resolved actor and decision for `event`. A malformed actor counts as
    /// no actor.
    pub fn evaluate<E: Event>(&self, event: &E) -> (Option<Identity>, Decision) {
        let actor = resolve_actor(event);
        (actor, self.store.decide(actor))
    }

    /// Callback queries get the alert form so the refusal is actually seen.
    pub fn denial_notice(&self, kind: EventKind) -> Notice {
        match kind {
            EventKind::Message => Notice::reply(self.denied_text.clone()),
            EventKind::CallbackQuery => Notice::alert(self.denied_text.clone()),
        }
    }
}

#[async_trait]
impl<E: Event> Middleware<E> for AdmissionGate {
    async fn call(&self, event: &E, next: Next<'_, E>) -> WardenResult<Flow> {
        let (actor, decision) = self.evaluate(event);

        if decision.allowed {
            tracing::debug!(
                actor = ?actor.map(Identity::get),
                reason = ?decision.reason,
                "admitted"
            );
            return next.run(event).await;
        }

        tracing::warn!(
            actor = ?actor.map(Identity::get),
            kind = ?event.kind(),
            reason = ?decision.reason,
            "rejected"
        );

        if let Err(e) = event.notify(self.denial_notice(event.kind())).await {
            tracing::warn!(error = %e, "failed to deliver denial notice");
        }
        Ok(Flow::Rejected)
    }
}

fn resolve_actor<E: Event>(event: &E) -> Option<Identity> {
    match event.actor() {
        Ok(actor) => actor,
        Err(e) => {
            tracing::warn!(
                kind = ?event.kind(),
                error = %e,
                "cannot resolve actor, treating as unknown"
            );
            None
        }
    }
}
