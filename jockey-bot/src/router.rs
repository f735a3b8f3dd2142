//! Command router
//!
//! Thin dispatch from inbound chat lines to session operations. Parsing is
//! deliberately dumb: first word selects the command (case-insensitive,
//! with the alias sets users already know), the rest is the argument.

use crate::error::Error;
use crate::session::registry::SessionRegistry;
use crate::session::{CommandContext, SessionCommand};
use jockey_common::api::CommandRequest;
use jockey_common::reply::EXPIRY_PING_SECS;
use jockey_common::Reply;
use std::sync::Arc;
use tracing::debug;

/// A parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Play { query: String },
    ShowQueue,
    Skip,
    Pause,
    Resume,
    ToggleLoop,
    Leave,
    NowPlaying,
    Ping,
    Unknown { name: String },
}

/// Parse one chat line (prefix already stripped by the gateway).
fn parse(text: &str) -> Command {
    let text = text.trim();
    let (name, rest) = match text.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (text, ""),
    };

    match name.to_ascii_lowercase().as_str() {
        "play" | "p" => Command::Play {
            query: rest.to_string(),
        },
        "queue" | "q" => Command::ShowQueue,
        "skip" | "s" => Command::Skip,
        "pause" | "pa" => Command::Pause,
        "resume" | "unpause" | "re" | "un" => Command::Resume,
        "loop" | "l" => Command::ToggleLoop,
        "leave" | "disconnect" => Command::Leave,
        "nowplaying" | "np" => Command::NowPlaying,
        "ping" => Command::Ping,
        other => Command::Unknown {
            name: other.to_string(),
        },
    }
}

/// Routes inbound commands to sessions and shapes the replies.
pub struct CommandRouter {
    registry: Arc<SessionRegistry>,
}

impl CommandRouter {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }

    /// Dispatch one request. Always produces exactly one reply; rejected
    /// commands come back as short-lived explanatory payloads.
    pub async fn dispatch(&self, request: &CommandRequest) -> Reply {
        let command = parse(&request.text);
        debug!(
            "room {}: dispatching {:?} from {}",
            request.room_id, command, request.author
        );

        let ctx = CommandContext {
            voice_channel: request.voice_channel_id,
            text_channel: request.text_channel_id,
            author: request.author.clone(),
        };

        match command {
            Command::Ping => {
                let latency = match request.gateway_latency_ms {
                    Some(ms) => format!("{} ms", ms),
                    None => "n/a".to_string(),
                };
                Reply::titled("Pong!   🏓", Some(EXPIRY_PING_SECS)).with_body(latency)
            }

            Command::Unknown { name } => Reply::error(format!("Unknown command: {}", name)),

            Command::Play { query } => {
                if query.is_empty() {
                    return Reply::error("Usage: play <song name or link>");
                }
                // Reject before touching the registry: a rejected play
                // must not create a session either.
                if request.voice_channel_id.is_none() {
                    return Error::NotInVoice.into_reply();
                }
                // The only command allowed to create a session.
                let session = self.registry.get_or_create(request.room_id);
                finish(session.command(SessionCommand::Play { query }, ctx).await)
            }

            Command::ShowQueue => self.on_existing(request, ctx, SessionCommand::ShowQueue).await,
            Command::NowPlaying => {
                self.on_existing(request, ctx, SessionCommand::NowPlaying).await
            }
            Command::Skip => self.on_existing(request, ctx, SessionCommand::Skip).await,
            Command::Pause => self.on_existing(request, ctx, SessionCommand::Pause).await,
            Command::Resume => self.on_existing(request, ctx, SessionCommand::Resume).await,
            Command::ToggleLoop => {
                self.on_existing(request, ctx, SessionCommand::ToggleLoop).await
            }
            Command::Leave => self.on_existing(request, ctx, SessionCommand::Leave).await,
        }
    }

    /// Run a command that requires an existing session. The non-creating
    /// lookup keeps read-only queries (queue, nowplaying) side-effect free.
    async fn on_existing(
        &self,
        request: &CommandRequest,
        ctx: CommandContext,
        op: SessionCommand,
    ) -> Reply {
        if request.voice_channel_id.is_none() {
            return Error::NotInVoice.into_reply();
        }
        match self.registry.get(request.room_id) {
            Some(session) => finish(session.command(op, ctx).await),
            None => Error::NoActiveSession.into_reply(),
        }
    }
}

/// A session that terminated mid-command reads as "no session".
fn finish(reply: Option<Reply>) -> Reply {
    reply.unwrap_or_else(|| Error::NoActiveSession.into_reply())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_play_with_query() {
        assert_eq!(
            parse("play dark necessities"),
            Command::Play {
                query: "dark necessities".to_string()
            }
        );
    }

    #[test]
    fn test_parse_aliases_case_insensitive() {
        assert_eq!(
            parse("P snow"),
            Command::Play {
                query: "snow".to_string()
            }
        );
        assert_eq!(parse("Q"), Command::ShowQueue);
        assert_eq!(parse("SKIP"), Command::Skip);
        assert_eq!(parse("NP"), Command::NowPlaying);
        assert_eq!(parse("UNPAUSE"), Command::Resume);
        assert_eq!(parse("disconnect"), Command::Leave);
        assert_eq!(parse("l"), Command::ToggleLoop);
    }

    #[test]
    fn test_parse_play_without_query() {
        assert_eq!(
            parse("play"),
            Command::Play {
                query: String::new()
            }
        );
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(
            parse("shuffle"),
            Command::Unknown {
                name: "shuffle".to_string()
            }
        );
    }

    #[test]
    fn test_parse_trims_whitespace() {
        assert_eq!(
            parse("  play   a  b  "),
            Command::Play {
                query: "a  b".to_string()
            }
        );
    }
}
