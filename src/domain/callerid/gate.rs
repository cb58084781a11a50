//! Message gating for users in caller ID mode.

use tracing::{debug, info};

use super::AcceptStores;
use crate::domain::{Decision, Numeric, Reply, ReplySink, User};

/// Decides whether a private message or notice reaches a +g recipient.
#[derive(Debug, Clone)]
pub struct GatingEngine {
    oper_override: bool,
    cooldown: u64,
}

impl GatingEngine {
    pub fn new(oper_override: bool, cooldown: u64) -> Self {
        Self {
            oper_override,
            cooldown,
        }
    }

    /// Decide delivery of one message from `sender` to `recipient` at `now`
    /// (seconds since the epoch).
    ///
    /// A denied sender always gets 716. The 717/718 pair is sent at most once
    /// per cooldown window per recipient, whoever the sender is.
    pub fn decide(
        &self,
        stores: &mut AcceptStores,
        sender: &User,
        recipient: &User,
        now: u64,
        replies: &mut dyn ReplySink,
    ) -> Decision {
        if !recipient.callerid {
            return Decision::Allow;
        }

        if self.oper_override && sender.oper {
            debug!(sender = %sender.nick, recipient = %recipient.nick, "Operator override");
            return Decision::Allow;
        }

        let Some(store) = stores.get(recipient.id, true) else {
            return Decision::Allow;
        };
        if store.contains(sender.id) {
            return Decision::Allow;
        }

        replies.send_reply(
            Reply::new(sender, Numeric::TargUmodeG)
                .param(&recipient.nick)
                .text("is in +g mode (server-side ignore)."),
        );

        if store.notify_due(now, self.cooldown) {
            replies.send_reply(
                Reply::new(sender, Numeric::TargNotify)
                    .param(&recipient.nick)
                    .text("has been informed that you messaged them."),
            );
            replies.send_reply(
                Reply::new(recipient, Numeric::UmodeGMsg)
                    .param(&sender.nick)
                    .param(sender.mask())
                    .text("is messaging you, and you have umode +g"),
            );
            store.mark_notified(now);
            info!(
                sender = %sender.nick,
                recipient = %recipient.nick,
                "Caller ID notification sent"
            );
        } else {
            debug!(
                sender = %sender.nick,
                recipient = %recipient.nick,
                last_notify = ?store.last_notify(),
                "Caller ID notification throttled"
            );
        }

        Decision::Deny
    }
}
