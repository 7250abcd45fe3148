//! Built-in command handlers.

use crate::dispatcher::{Flow, Handler};
use crate::event::{Event, EventKind, Notice};
use async_trait::async_trait;
use warden_core::error::WardenResult;

pub const HELP_TEXT: &str = "Commands: /help, /echo";
pub const EMPTY_ECHO: &str = "Empty 0_o";

/// Splits `/cmd@bot rest` into `("cmd", "rest")`.
///
/// Returns `None` for anything that is not a command.
pub fn parse_command(text: &str) -> Option<(&str, &str)> {
    let body = text.strip_prefix('/')?;
    let (head, rest) = match body.find(char::is_whitespace) {
        Some(i) => (&body[..i], body[i..].trim()),
        None => (body, ""),
    };
    let name = head.split('@').next().unwrap_or(head);
    if name.is_empty() {
        return None;
    }
    Some((name, rest))
}

fn command_of<E: Event>(event: &E) -> Option<(&str, &str)> {
    if event.kind() != EventKind::Message {
        return None;
    }
    event.text().and_then(parse_command)
}

/// `/help`: lists the available commands.
#[derive(Debug, Default)]
pub struct HelpHandler;

#[async_trait]
impl<E: Event> Handler<E> for HelpHandler {
    async fn handle(&self, event: &E) -> WardenResult<Flow> {
        match command_of(event) {
            Some(("help", _)) => {
                event.notify(Notice::reply(HELP_TEXT)).await?;
                Ok(Flow::Handled)
            }
            _ => Ok(Flow::Unhandled),
        }
    }
}

/// `/echo <text>`: repeats the payload back.
#[derive(Debug, Default)]
pub struct EchoHandler;

#[async_trait]
impl<E: Event> Handler<E> for EchoHandler {
    async fn handle(&self, event: &E) -> WardenResult<Flow> {
        let payload = match command_of(event) {
            Some(("echo", payload)) => payload.to_string(),
            _ => return Ok(Flow::Unhandled),
        };
        let reply = if payload.is_empty() {
            EMPTY_ECHO.to_string()
        } else {
            payload
        };
        event.notify(Notice::reply(reply)).await?;
        Ok(Flow::Handled)
    }
}
