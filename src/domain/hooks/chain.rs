//! Hook chain implementation.

use tracing::{debug, warn};

use crate::config::Config;
use crate::domain::callerid::CallerIdSettings;
use crate::domain::{CallerIdError, Decision, MessageKind, User, UserDirectory, UserId};

use super::{CallerIdModule, CommandResult, Hook, HookContext};

/// Chain of hooks that server events are dispatched through.
pub struct HookChain {
    hooks: Vec<Box<dyn Hook>>,
}

impl HookChain {
    /// Create a new HookChain from configuration.
    pub fn new(config: &Config) -> Result<Self, CallerIdError> {
        let mut hooks: Vec<Box<dyn Hook>> = Vec::new();

        hooks.push(Box::new(CallerIdModule::new(CallerIdSettings::try_from(
            &config.callerid,
        )?)));

        // Sort by priority (lower = higher priority)
        hooks.sort_by_key(|h| h.priority());

        Ok(Self { hooks })
    }

    /// Run pre-message hooks and return the first denying decision.
    pub fn pre_message(
        &mut self,
        ctx: &mut HookContext<'_>,
        sender: &User,
        target: &User,
        kind: MessageKind,
    ) -> Decision {
        for hook in &mut self.hooks {
            if hook.on_pre_message(ctx, sender, target, kind).is_deny() {
                debug!(hook = hook.name(), "Message denied");
                return Decision::Deny;
            }
        }

        Decision::Allow
    }

    pub fn user_quit(&mut self, users: &dyn UserDirectory, who: UserId) {
        for hook in &mut self.hooks {
            hook.on_user_quit(users, who);
        }
    }

    pub fn user_pre_nick(&mut self, users: &dyn UserDirectory, who: UserId, new_nick: &str) {
        for hook in &mut self.hooks {
            hook.on_user_pre_nick(users, who, new_nick);
        }
    }

    /// Unload every hook, releasing their per-user state.
    pub fn cleanup(&mut self) {
        for hook in &mut self.hooks {
            hook.on_cleanup();
        }
    }

    /// Collect ISUPPORT tokens from every hook.
    pub fn isupport(&self) -> Vec<String> {
        let mut tokens = Vec::new();
        for hook in &self.hooks {
            hook.on_isupport(&mut tokens);
        }
        tokens
    }

    /// Apply new configuration to every hook.
    ///
    /// A hook that rejects the configuration keeps its previous values; the
    /// first error is returned after all hooks have been offered the config.
    pub fn rehash(&mut self, config: &Config) -> Result<(), CallerIdError> {
        let mut first_error = None;
        for hook in &mut self.hooks {
            if let Err(e) = hook.on_rehash(config) {
                warn!(hook = hook.name(), error = %e, "Rehash rejected");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Dispatch a command to the first hook that handles it.
    pub fn command(
        &mut self,
        ctx: &mut HookContext<'_>,
        invoker: &User,
        command: &str,
        args: &[String],
    ) -> Option<CommandResult> {
        self.hooks
            .iter_mut()
            .find_map(|hook| hook.on_command(ctx, invoker, command, args))
    }
}
