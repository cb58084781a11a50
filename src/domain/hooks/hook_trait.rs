//! Hook trait definition.

use crate::config::Config;
use crate::domain::{CallerIdError, Decision, MessageKind, ReplySink, User, UserDirectory, UserId};

/// What a hook sees while handling one event.
pub struct HookContext<'a> {
    pub users: &'a dyn UserDirectory,
    pub replies: &'a mut dyn ReplySink,
    /// Event time in seconds since the epoch.
    pub now: u64,
}

/// Aggregate result of a command handled by a hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandResult {
    Success,
    Failure,
}

/// Trait for server event hooks.
///
/// Every method has a no-op default so a hook only implements the events it
/// cares about.
pub trait Hook: Send {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Get the priority of this hook (lower = runs first).
    fn priority(&self) -> u32;

    /// Called before a private message or notice is delivered.
    fn on_pre_message(
        &mut self,
        _ctx: &mut HookContext<'_>,
        _sender: &User,
        _target: &User,
        _kind: MessageKind,
    ) -> Decision {
        Decision::Allow
    }

    /// Called before a quitting user is removed from the directory.
    fn on_user_quit(&mut self, _users: &dyn UserDirectory, _who: UserId) {}

    /// Called before a user's nick changes.
    fn on_user_pre_nick(&mut self, _users: &dyn UserDirectory, _who: UserId, _new_nick: &str) {}

    /// Called when the hook is unloaded. Release all per-user state.
    fn on_cleanup(&mut self) {}

    /// Append tokens to the ISUPPORT (005) reply.
    fn on_isupport(&self, _tokens: &mut Vec<String>) {}

    /// Apply reloaded configuration.
    fn on_rehash(&mut self, _config: &Config) -> Result<(), CallerIdError> {
        Ok(())
    }

    /// Handle a command. Returns `None` if the command is not this hook's.
    fn on_command(
        &mut self,
        _ctx: &mut HookContext<'_>,
        _invoker: &User,
        _command: &str,
        _args: &[String],
    ) -> Option<CommandResult> {
        None
    }
}
