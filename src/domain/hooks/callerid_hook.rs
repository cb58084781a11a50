//! Caller ID hook: user mode +g and the ACCEPT command.

use tracing::{debug, info};

use super::{CommandResult, Hook, HookContext};
use crate::config::Config;
use crate::domain::callerid::{
    AcceptCommand, AcceptStores, CallerIdSettings, CommandOutcome, GatingEngine,
    LifecycleCoordinator, ISUPPORT_TOKEN,
};
use crate::domain::{
    CallerIdError, Decision, MessageKind, Numeric, Reply, User, UserDirectory, UserId,
};

/// Owns every accept list and wires the caller ID engine into server events.
pub struct CallerIdModule {
    settings: CallerIdSettings,
    stores: AcceptStores,
    command: AcceptCommand,
    gate: GatingEngine,
    lifecycle: LifecycleCoordinator,
}

impl CallerIdModule {
    pub fn new(settings: CallerIdSettings) -> Self {
        Self {
            settings,
            stores: AcceptStores::new(),
            command: AcceptCommand::new(settings.max_accepts),
            gate: GatingEngine::new(settings.oper_override, settings.cooldown),
            lifecycle: LifecycleCoordinator::new(settings.track_nick),
        }
    }

    #[cfg(test)]
    pub fn settings(&self) -> CallerIdSettings {
        self.settings
    }

    #[cfg(test)]
    pub fn stores(&self) -> &AcceptStores {
        &self.stores
    }

    /// Run ACCEPT for `invoker`, returning the per-token outcome.
    pub fn accept(
        &mut self,
        ctx: &mut HookContext<'_>,
        invoker: &User,
        args: &[String],
    ) -> CommandOutcome {
        self.command
            .handle(&mut self.stores, ctx.users, invoker, args, &mut *ctx.replies)
    }

    fn apply(&mut self, settings: CallerIdSettings) {
        // Existing lists are left as they are if maxaccepts was lowered
        self.command = AcceptCommand::new(settings.max_accepts);
        self.gate = GatingEngine::new(settings.oper_override, settings.cooldown);
        self.lifecycle = LifecycleCoordinator::new(settings.track_nick);
        self.settings = settings;
    }
}

impl Hook for CallerIdModule {
    fn name(&self) -> &'static str {
        "callerid"
    }

    fn priority(&self) -> u32 {
        10
    }

    fn on_pre_message(
        &mut self,
        ctx: &mut HookContext<'_>,
        sender: &User,
        target: &User,
        kind: MessageKind,
    ) -> Decision {
        // Messages from other servers were already checked there
        if !sender.local {
            return Decision::Allow;
        }
        let decision = self
            .gate
            .decide(&mut self.stores, sender, target, ctx.now, &mut *ctx.replies);
        if decision.is_deny() {
            debug!(
                command = kind.command(),
                sender = %sender.nick,
                target = %target.nick,
                "Blocked by caller ID"
            );
        }
        decision
    }

    fn on_user_quit(&mut self, users: &dyn UserDirectory, who: UserId) {
        let purged = self.lifecycle.on_user_quit(&mut self.stores, users, who);
        debug!(user = %who, purged, lists = self.stores.len(), "Quit cleared accept entries");
    }

    fn on_user_pre_nick(&mut self, users: &dyn UserDirectory, who: UserId, new_nick: &str) {
        let purged = self.lifecycle.on_user_pre_nick(&mut self.stores, users, who);
        if purged > 0 {
            debug!(user = %who, new_nick, purged, "Nick change invalidated accept entries");
        }
    }

    fn on_cleanup(&mut self) {
        self.lifecycle.on_cleanup(&mut self.stores);
    }

    fn on_isupport(&self, tokens: &mut Vec<String>) {
        tokens.push(ISUPPORT_TOKEN.to_string());
    }

    fn on_rehash(&mut self, config: &Config) -> Result<(), CallerIdError> {
        let settings = CallerIdSettings::try_from(&config.callerid)?;
        if settings != self.settings {
            info!(
                max_accepts = settings.max_accepts,
                oper_override = settings.oper_override,
                track_nick = settings.track_nick,
                cooldown = settings.cooldown,
                "Caller ID settings reloaded"
            );
        }
        self.apply(settings);
        Ok(())
    }

    fn on_command(
        &mut self,
        ctx: &mut HookContext<'_>,
        invoker: &User,
        command: &str,
        args: &[String],
    ) -> Option<CommandResult> {
        if !command.eq_ignore_ascii_case("ACCEPT") {
            return None;
        }

        if args.is_empty() {
            ctx.replies.send_reply(
                Reply::new(invoker, Numeric::NeedMoreParams)
                    .param("ACCEPT")
                    .text("Not enough parameters"),
            );
            return Some(CommandResult::Failure);
        }

        let outcome = self.accept(ctx, invoker, args);
        Some(if outcome.is_failure() {
            CommandResult::Failure
        } else {
            CommandResult::Success
        })
    }
}
