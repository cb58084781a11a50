//! Hook system for server events.

mod callerid_hook;
mod chain;
mod hook_trait;

pub use callerid_hook::CallerIdModule;
pub use chain::HookChain;
pub use hook_trait::{CommandResult, Hook, HookContext};
