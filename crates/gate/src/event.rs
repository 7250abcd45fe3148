//! What the pipeline needs from a chat event.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use warden_core::error::WardenResult;
use warden_core::Identity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Plain chat message or command.
    Message,
    /// Inline-button press. Answered with an acknowledgement, optionally as
    /// an alert.
    CallbackQuery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeStyle {
    /// Regular message into the originating chat.
    Reply,
    /// Modal alert; only meaningful for callback queries.
    Alert,
}

/// Outbound text addressed back to where an event came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub text: String,
    pub style: NoticeStyle,
}

impl Notice {
    pub fn reply(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: NoticeStyle::Reply,
        }
    }

    pub fn alert(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: NoticeStyle::Alert,
        }
    }
}

/// An inbound event as delivered by the chat client.
///
/// `'static` because events are owned updates moved through the pipeline.
#[async_trait]
pub trait Event: Send + Sync + 'static {
    fn kind(&self) -> EventKind;

    /// Actor that issued the event.
    ///
    /// `Ok(None)` when the event carries no actor (channel posts, anonymous
    /// admins); `Err` when the payload is malformed.
    fn actor(&self) -> WardenResult<Option<Identity>>;

    /// Message text, or callback data for callback queries.
    fn text(&self) -> Option<&str>;

    async fn notify(&self, notice: Notice) -> WardenResult<()>;
}
