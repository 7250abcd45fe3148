//! JSON-encoded inbound events.
//!
//! One object per event:
//!
//! ```json
//! {"kind": "message", "chat_id": 5, "from": {"id": 42}, "text": "/echo hi"}
//! {"kind": "callback_query", "from": {"id": 42}, "data": "page:2"}
//! ```
//!
//! Notices sent in response are collected in an outbox and drained by the
//! caller with [`InboundEvent::take_notices`].

use crate::event::{Event, EventKind, Notice};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::Value;
use warden_core::error::{WardenError, WardenResult};
use warden_core::Identity;

#[derive(Debug, Deserialize)]
pub struct InboundEvent {
    pub kind: EventKind,
    #[serde(default)]
    pub chat_id: Option<i64>,
    /// Kept raw so a malformed sender does not fail the whole event.
    #[serde(default)]
    pub from: Option<Value>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(skip)]
    outbox: Mutex<Vec<Notice>>,
}

impl InboundEvent {
    pub fn message(from: Option<Identity>, text: impl Into<String>) -> Self {
        Self::build(EventKind::Message, from, Some(text.into()), None)
    }

    pub fn callback_query(from: Option<Identity>, data: impl Into<String>) -> Self {
        Self::build(EventKind::CallbackQuery, from, None, Some(data.into()))
    }

    fn build(
        kind: EventKind,
        from: Option<Identity>,
        text: Option<String>,
        data: Option<String>,
    ) -> Self {
        Self {
            kind,
            chat_id: None,
            from: from.map(|id| serde_json::json!({ "id": id.get() })),
            text,
            data,
            outbox: Mutex::new(Vec::new()),
        }
    }

    pub fn from_json(line: &str) -> WardenResult<Self> {
        serde_json::from_str(line).map_err(|e| WardenError::InvalidInput(format!("event: {e}")))
    }

    /// Drains the notices sent so far.
    pub fn take_notices(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.outbox.lock())
    }
}

#[async_trait]
impl Event for InboundEvent {
    fn kind(&self) -> EventKind {
        self.kind
    }

    fn actor(&self) -> WardenResult<Option<Identity>> {
        match &self.from {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Object(sender)) => sender
                .get("id")
                .and_then(Value::as_i64)
                .map(|id| Some(Identity::new(id)))
                .ok_or_else(|| WardenError::InvalidInput("sender has no integer id".into())),
            Some(other) => Err(WardenError::InvalidInput(format!(
                "sender must be an object, got {other}"
            ))),
        }
    }

    fn text(&self) -> Option<&str> {
        match self.kind {
            EventKind::Message => self.text.as_deref(),
            EventKind::CallbackQuery => self.data.as_deref(),
        }
    }

    async fn notify(&self, notice: Notice) -> WardenResult<()> {
        self.outbox.lock().push(notice);
        Ok(())
    }
}
