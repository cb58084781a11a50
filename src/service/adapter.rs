//! Event parsing and output formatting.
//!
//! Input is one JSON object per line, tagged by `event`:
//!
//! ```text
//! {"event":"connect","nick":"alice","local":true}
//! {"event":"mode","nick":"alice","modes":"+g"}
//! {"event":"accept","nick":"alice","args":["bob,carol"]}
//! {"event":"privmsg","from":"bob","to":"alice","text":"hi","at":10}
//! {"event":"nick","nick":"bob","new_nick":"robert"}
//! {"event":"quit","nick":"bob"}
//! {"event":"rehash"}
//! {"event":"unload"}
//! ```
//!
//! Output is either JSON objects or IRC wire lines.

use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::cli::Format;
use crate::domain::{CallerIdError, MessageKind, Reply, User};

/// One input line: an event and its optional timestamp.
#[derive(Debug, Clone, Deserialize)]
pub struct EventLine {
    /// Event time in seconds since the epoch; the system clock if absent
    #[serde(default)]
    pub at: Option<u64>,

    #[serde(flatten)]
    pub event: Event,
}

/// Server events understood by the event service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum Event {
    Connect {
        nick: String,
        #[serde(default)]
        ident: Option<String>,
        #[serde(default)]
        host: Option<String>,
        #[serde(default = "default_local")]
        local: bool,
        #[serde(default)]
        oper: bool,
    },
    Mode {
        nick: String,
        modes: String,
    },
    Nick {
        nick: String,
        new_nick: String,
    },
    Quit {
        nick: String,
    },
    Privmsg {
        from: String,
        to: String,
        text: String,
    },
    Notice {
        from: String,
        to: String,
        text: String,
    },
    Accept {
        nick: String,
        #[serde(default)]
        args: Vec<String>,
    },
    Rehash,
    Unload,
}

fn default_local() -> bool {
    true
}

/// Something the service emits for one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    /// Numeric reply to a user
    Reply(Reply),
    /// A message that passed the hooks
    Deliver {
        from: User,
        to: String,
        kind: MessageKind,
        text: String,
    },
    /// An event that could not be processed
    Error(String),
}

/// Adapter between the line protocol and internal types.
pub struct FormatAdapter {
    format: Format,
    server_name: String,
}

impl FormatAdapter {
    /// Create a new adapter for the specified format.
    pub fn new(format: Format, server_name: impl Into<String>) -> Self {
        Self {
            format,
            server_name: server_name.into(),
        }
    }

    pub fn set_server_name(&mut self, server_name: impl Into<String>) {
        self.server_name = server_name.into();
    }

    /// Parse one input line.
    pub fn parse_event(&self, input: &str) -> Result<EventLine, CallerIdError> {
        let line: EventLine = serde_json::from_str(input)?;
        debug!(event = ?line.event, at = ?line.at, "Parsed event");
        Ok(line)
    }

    /// Encode one output as a single line.
    pub fn format_output(&self, output: &Output) -> String {
        match self.format {
            Format::Json => self.format_json(output),
            Format::Irc => self.format_irc(output),
        }
    }

    // === JSON ===

    fn format_json(&self, output: &Output) -> String {
        match output {
            Output::Reply(reply) => json!({
                "type": "numeric",
                "to": reply.params.first(),
                "numeric": reply.numeric.code(),
                "params": reply.params,
                "text": reply.text,
            }),
            Output::Deliver {
                from,
                to,
                kind,
                text,
            } => json!({
                "type": "deliver",
                "command": kind.command(),
                "from": from.nick,
                "to": to,
                "text": text,
            }),
            Output::Error(message) => json!({
                "type": "error",
                "message": message,
            }),
        }
        .to_string()
    }

    // === IRC wire ===

    fn format_irc(&self, output: &Output) -> String {
        match output {
            Output::Reply(reply) => {
                let mut line = format!(
                    ":{} {:03} {}",
                    self.server_name,
                    reply.numeric.code(),
                    reply.params.join(" ")
                );
                if let Some(text) = &reply.text {
                    line.push_str(" :");
                    line.push_str(text);
                }
                line
            }
            Output::Deliver {
                from,
                to,
                kind,
                text,
            } => format!(
                ":{}!{} {} {} :{}",
                from.nick,
                from.mask(),
                kind.command(),
                to,
                text
            ),
            Output::Error(message) => format!("ERROR :{}", message),
        }
    }
}
