//! Caller ID engine: accept lists, the ACCEPT command, message gating and
//! user lifecycle cleanup.

mod command;
mod gate;
mod lifecycle;
mod store;

pub use command::{AcceptCommand, CommandOutcome};
pub use gate::GatingEngine;
pub use lifecycle::LifecycleCoordinator;
pub use store::AcceptStores;
#[allow(unused_imports)]
pub use store::AcceptListStore;

use crate::config::CallerIdConfig;
use crate::domain::CallerIdError;

/// ISUPPORT token advertising the caller ID user mode.
pub const ISUPPORT_TOKEN: &str = "CALLERID=g";

/// Runtime values read from the `[callerid]` configuration table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerIdSettings {
    /// Maximum ACCEPT entries per user.
    pub max_accepts: usize,
    /// Operators bypass caller ID.
    pub oper_override: bool,
    /// ACCEPT entries survive nick changes.
    pub track_nick: bool,
    /// Seconds between "you have been messaged" notifications.
    pub cooldown: u64,
}

impl Default for CallerIdSettings {
    fn default() -> Self {
        Self {
            max_accepts: 16,
            oper_override: false,
            track_nick: false,
            cooldown: 60,
        }
    }
}

impl TryFrom<&CallerIdConfig> for CallerIdSettings {
    type Error = CallerIdError;

    fn try_from(config: &CallerIdConfig) -> Result<Self, Self::Error> {
        if config.maxaccepts == 0 {
            return Err(CallerIdError::Config(
                "callerid.maxaccepts must be at least 1".to_string(),
            ));
        }
        let max_accepts = usize::try_from(config.maxaccepts)
            .map_err(|_| CallerIdError::Config("callerid.maxaccepts is too large".to_string()))?;
        Ok(Self {
            max_accepts,
            oper_override: config.operoverride,
            track_nick: config.tracknick,
            cooldown: config.cooldown,
        })
    }
}
