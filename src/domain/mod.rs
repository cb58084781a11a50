//! Domain layer containing the caller ID engine.
//!
//! This module contains:
//! - Users, numerics and delivery decisions
//! - Accept list storage, the ACCEPT command, gating and lifecycle cleanup
//! - Hook trait and chain that server events are dispatched through
//! - In-memory user registry
//! - Logger with rotation

pub mod callerid;
mod error;
pub mod hooks;
pub mod logger;
pub mod parser;
pub mod registry;
mod types;

pub use error::CallerIdError;
pub use hooks::{HookChain, HookContext};
pub use registry::{NewUser, UserRegistry};
pub use types::{
    Decision, MessageKind, Numeric, Reply, ReplySink, Silent, User, UserDirectory, UserId,
};
