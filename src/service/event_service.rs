//! Event processing service.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, Result};
use tracing::{debug, error, info, warn};

use crate::cli::Format;
use crate::config::{Config, ConfigService};
use crate::domain::{
    Decision, HookChain, HookContext, MessageKind, NewUser, Numeric, Reply, User, UserDirectory,
    UserRegistry,
};
use crate::service::adapter::{Event, EventLine, FormatAdapter, Output};

/// Drives the hook chain from a stream of server events.
///
/// Events are handled one at a time, each to completion, so hooks never see
/// an interleaved event.
pub struct EventService {
    config: Config,
    config_path: Option<PathBuf>,
    registry: UserRegistry,
    chain: HookChain,
    adapter: FormatAdapter,
    unloaded: bool,
}

impl EventService {
    /// Create a new EventService with the specified output format.
    ///
    /// `config_path` is re-read on rehash.
    pub fn new(config: Config, config_path: Option<PathBuf>, format: Format) -> Result<Self> {
        let chain = HookChain::new(&config)?;
        let adapter = FormatAdapter::new(format, config.server_name.clone());
        Ok(Self {
            config,
            config_path,
            registry: UserRegistry::new(),
            chain,
            adapter,
            unloaded: false,
        })
    }

    /// Run the event loop.
    ///
    /// Reads one JSON event per line from stdin until EOF and writes the
    /// resulting lines to stdout. A bad event produces an error line and
    /// processing continues.
    pub fn run(&mut self) -> Result<()> {
        let stdin = io::stdin();
        let stdout = io::stdout();
        let mut stdout = stdout.lock();

        for line in stdin.lock().lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            for output in self.process_line(&line) {
                writeln!(stdout, "{}", self.adapter.format_output(&output))?;
            }
            stdout.flush()?;
        }

        info!(users = self.registry.len(), "Input closed");
        Ok(())
    }

    /// Parse and process one input line.
    pub fn process_line(&mut self, line: &str) -> Vec<Output> {
        let event = match self.adapter.parse_event(line) {
            Ok(event) => event,
            Err(e) => {
                let message = format!("Failed to parse event: {}", e);
                error!("{}", message);
                return vec![Output::Error(message)];
            }
        };

        match self.process(event) {
            Ok(outputs) => outputs,
            Err(e) => {
                warn!(error = %e, "Event rejected");
                vec![Output::Error(e.to_string())]
            }
        }
    }

    /// Process one event and return what it produced.
    pub fn process(&mut self, line: EventLine) -> Result<Vec<Output>> {
        let now = line.at.unwrap_or_else(unix_now);

        match line.event {
            Event::Connect {
                nick,
                ident,
                host,
                local,
                oper,
            } => self.handle_connect(NewUser {
                ident: ident.unwrap_or_else(|| nick.clone()),
                host: host.unwrap_or_else(|| "localhost".to_string()),
                nick,
                local,
                oper,
            }),
            Event::Mode { nick, modes } => self.handle_mode(&nick, &modes),
            Event::Nick { nick, new_nick } => self.handle_nick(&nick, &new_nick),
            Event::Quit { nick } => self.handle_quit(&nick),
            Event::Privmsg { from, to, text } => {
                self.handle_message(MessageKind::Privmsg, &from, &to, text, now)
            }
            Event::Notice { from, to, text } => {
                self.handle_message(MessageKind::Notice, &from, &to, text, now)
            }
            Event::Accept { nick, args } => self.handle_accept(&nick, &args, now),
            Event::Rehash => self.handle_rehash(),
            Event::Unload => self.handle_unload(),
        }
    }

    fn find(&self, nick: &str) -> Result<User> {
        self.registry
            .find_nick(nick)
            .cloned()
            .ok_or_else(|| anyhow!("No such nick: {}", nick))
    }

    fn handle_connect(&mut self, new_user: NewUser) -> Result<Vec<Output>> {
        let id = self.registry.connect(new_user)?;
        let user = self
            .registry
            .get(id)
            .cloned()
            .ok_or_else(|| anyhow!("User {} vanished after connect", id))?;
        debug!(nick = %user.nick, id = %id, local = user.local, "User connected");

        let tokens = if self.unloaded {
            Vec::new()
        } else {
            self.chain.isupport()
        };
        if !user.local || tokens.is_empty() {
            return Ok(Vec::new());
        }

        let reply = tokens
            .into_iter()
            .fold(Reply::new(&user, Numeric::ISupport), |reply, token| {
                reply.param(token)
            })
            .text("are supported by this server");
        Ok(vec![Output::Reply(reply)])
    }

    fn handle_mode(&mut self, nick: &str, modes: &str) -> Result<Vec<Output>> {
        let user = self.find(nick)?;
        // +g disappears with the module
        let modes = if self.unloaded {
            modes.replace('g', "")
        } else {
            modes.to_string()
        };
        let unknown = self.registry.apply_modes(user.id, &modes)?;
        if unknown.is_empty() {
            return Ok(Vec::new());
        }
        let unknown: String = unknown.into_iter().collect();
        Ok(vec![Output::Error(format!("Unknown mode characters: {}", unknown))])
    }

    fn handle_nick(&mut self, nick: &str, new_nick: &str) -> Result<Vec<Output>> {
        let user = self.find(nick)?;
        // Same nick, same case: nothing changes
        if user.nick == new_nick {
            return Ok(Vec::new());
        }
        // Hooks only hear about nick changes that will succeed
        self.registry.check_rename(user.id, new_nick)?;
        if !self.unloaded {
            self.chain.user_pre_nick(&self.registry, user.id, new_nick);
        }
        self.registry.rename(user.id, new_nick)?;
        debug!(old = %nick, new = %new_nick, "Nick changed");
        Ok(Vec::new())
    }

    fn handle_quit(&mut self, nick: &str) -> Result<Vec<Output>> {
        let user = self.find(nick)?;
        if !self.unloaded {
            self.chain.user_quit(&self.registry, user.id);
        }
        self.registry.disconnect(user.id);
        debug!(nick = %user.nick, "User quit");
        Ok(Vec::new())
    }

    fn handle_message(
        &mut self,
        kind: MessageKind,
        from: &str,
        to: &str,
        text: String,
        now: u64,
    ) -> Result<Vec<Output>> {
        let sender = self.find(from)?;
        let Some(target) = self.registry.find_nick(to).cloned() else {
            let reply = Reply::new(&sender, Numeric::NoSuchNick)
                .param(to)
                .text("No such nick/channel");
            return Ok(vec![Output::Reply(reply)]);
        };

        let mut replies: Vec<Reply> = Vec::new();

        let decision = if self.unloaded {
            Decision::Allow
        } else {
            let mut ctx = HookContext {
                users: &self.registry,
                replies: &mut replies,
                now,
            };
            self.chain.pre_message(&mut ctx, &sender, &target, kind)
        };

        let mut outputs: Vec<Output> = replies.into_iter().map(Output::Reply).collect();
        if decision == Decision::Allow {
            outputs.push(Output::Deliver {
                from: sender,
                to: target.nick,
                kind,
                text,
            });
        }
        Ok(outputs)
    }

    fn handle_accept(&mut self, nick: &str, args: &[String], now: u64) -> Result<Vec<Output>> {
        let invoker = self.find(nick)?;
        let mut replies: Vec<Reply> = Vec::new();

        let result = if self.unloaded {
            None
        } else {
            let mut ctx = HookContext {
                users: &self.registry,
                replies: &mut replies,
                now,
            };
            self.chain.command(&mut ctx, &invoker, "ACCEPT", args)
        };

        if result.is_none() {
            return Ok(vec![Output::Error("Unknown command: ACCEPT".to_string())]);
        }
        debug!(nick = %invoker.nick, result = ?result, "ACCEPT handled");
        Ok(replies.into_iter().map(Output::Reply).collect())
    }

    fn handle_rehash(&mut self) -> Result<Vec<Output>> {
        let config = ConfigService::load(self.config_path.as_deref())?;
        if !self.unloaded {
            self.chain.rehash(&config)?;
        }
        self.adapter.set_server_name(config.server_name.clone());
        self.config = config;
        info!(server_name = %self.config.server_name, "Configuration reloaded");
        Ok(Vec::new())
    }

    fn handle_unload(&mut self) -> Result<Vec<Output>> {
        if self.unloaded {
            return Ok(Vec::new());
        }
        self.chain.cleanup();
        for id in self.registry.user_ids() {
            self.registry.apply_modes(id, "-g")?;
        }
        self.unloaded = true;
        info!("Caller ID unloaded");
        Ok(Vec::new())
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> EventService {
        EventService::new(Config::default(), None, Format::Json).unwrap()
    }

    fn feed(service: &mut EventService, lines: &[&str]) -> Vec<Output> {
        lines
            .iter()
            .flat_map(|line| service.process_line(line))
            .collect()
    }

    fn numerics(outputs: &[Output]) -> Vec<u16> {
        outputs
            .iter()
            .filter_map(|o| match o {
                Output::Reply(r) => Some(r.numeric.code()),
                _ => None,
            })
            .collect()
    }

    fn delivered(outputs: &[Output]) -> usize {
        outputs
            .iter()
            .filter(|o| matches!(o, Output::Deliver { .. }))
            .count()
    }

    #[test]
    fn test_connect_sends_isupport_to_local_users_only() {
        let mut service = service();
        let outputs = feed(
            &mut service,
            &[
                r#"{"event":"connect","nick":"alice"}"#,
                r#"{"event":"connect","nick":"bob","local":false}"#,
            ],
        );
        assert_eq!(numerics(&outputs), vec![5]);
        match &outputs[0] {
            Output::Reply(r) => assert_eq!(r.params, vec!["alice", "CALLERID=g"]),
            other => panic!("unexpected output {:?}", other),
        }
    }

    #[test]
    fn test_gated_message_flow() {
        let mut service = service();
        feed(
            &mut service,
            &[
                r#"{"event":"connect","nick":"alice"}"#,
                r#"{"event":"connect","nick":"bob"}"#,
                r#"{"event":"mode","nick":"alice","modes":"+g"}"#,
            ],
        );

        let outputs = feed(
            &mut service,
            &[r#"{"event":"privmsg","from":"bob","to":"alice","text":"hi","at":100}"#],
        );
        assert_eq!(numerics(&outputs), vec![716, 717, 718]);
        assert_eq!(delivered(&outputs), 0);

        let outputs = feed(
            &mut service,
            &[
                r#"{"event":"accept","nick":"alice","args":["bob"]}"#,
                r#"{"event":"notice","from":"bob","to":"alice","text":"hi again","at":101}"#,
            ],
        );
        assert!(numerics(&outputs).is_empty());
        assert_eq!(delivered(&outputs), 1);
    }

    #[test]
    fn test_message_to_unknown_nick() {
        let mut service = service();
        let outputs = feed(
            &mut service,
            &[
                r#"{"event":"connect","nick":"bob","local":false}"#,
                r#"{"event":"privmsg","from":"bob","to":"ghost","text":"hi"}"#,
            ],
        );
        assert_eq!(numerics(&outputs), vec![401]);
    }

    #[test]
    fn test_failed_rename_keeps_accept_entries() {
        let mut service = service();
        let outputs = feed(
            &mut service,
            &[
                r#"{"event":"connect","nick":"alice"}"#,
                r#"{"event":"connect","nick":"bob"}"#,
                r#"{"event":"connect","nick":"carol"}"#,
                r#"{"event":"mode","nick":"alice","modes":"+g"}"#,
                r#"{"event":"accept","nick":"alice","args":["bob"]}"#,
                r#"{"event":"nick","nick":"bob","new_nick":"carol"}"#,
                r#"{"event":"privmsg","from":"bob","to":"alice","text":"still here"}"#,
            ],
        );
        assert!(outputs.iter().any(|o| matches!(o, Output::Error(_))));
        assert_eq!(delivered(&outputs), 1);
    }

    #[test]
    fn test_same_nick_keeps_accept_entries() {
        let mut service = service();
        let outputs = feed(
            &mut service,
            &[
                r#"{"event":"connect","nick":"alice"}"#,
                r#"{"event":"connect","nick":"bob"}"#,
                r#"{"event":"mode","nick":"alice","modes":"+g"}"#,
                r#"{"event":"accept","nick":"alice","args":["bob"]}"#,
                r#"{"event":"nick","nick":"bob","new_nick":"bob"}"#,
                r#"{"event":"privmsg","from":"bob","to":"alice","text":"same me"}"#,
            ],
        );
        assert_eq!(numerics(&outputs), vec![5, 5]);
        assert_eq!(delivered(&outputs), 1);
    }

    #[test]
    fn test_case_only_nick_change_clears_accept_entries() {
        let mut service = service();
        let outputs = feed(
            &mut service,
            &[
                r#"{"event":"connect","nick":"alice"}"#,
                r#"{"event":"connect","nick":"bob"}"#,
                r#"{"event":"mode","nick":"alice","modes":"+g"}"#,
                r#"{"event":"accept","nick":"alice","args":["bob"]}"#,
                r#"{"event":"nick","nick":"bob","new_nick":"Bob"}"#,
                r#"{"event":"privmsg","from":"Bob","to":"alice","text":"new case"}"#,
            ],
        );
        assert_eq!(delivered(&outputs), 0);
        assert_eq!(numerics(&outputs), vec![5, 5, 716, 717, 718]);
    }

    #[test]
    fn test_bad_line_does_not_stop_processing() {
        let mut service = service();
        let outputs = feed(
            &mut service,
            &["{not json", r#"{"event":"connect","nick":"alice"}"#],
        );
        assert!(matches!(outputs[0], Output::Error(_)));
        assert_eq!(numerics(&outputs), vec![5]);
    }

    #[test]
    fn test_unload_releases_lists_and_opens_gates() {
        let mut service = service();
        let outputs = feed(
            &mut service,
            &[
                r#"{"event":"connect","nick":"alice"}"#,
                r#"{"event":"connect","nick":"bob"}"#,
                r#"{"event":"mode","nick":"alice","modes":"+g"}"#,
                r#"{"event":"unload"}"#,
                r#"{"event":"privmsg","from":"bob","to":"alice","text":"hi"}"#,
                r#"{"event":"accept","nick":"alice","args":["bob"]}"#,
            ],
        );
        assert_eq!(delivered(&outputs), 1);
        assert!(matches!(outputs.last(), Some(Output::Error(_))));
        assert!(!service.registry.find_nick("alice").unwrap().callerid);
    }
}
