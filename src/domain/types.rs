//! Core domain types shared by the caller ID engine and the event service.

use std::fmt;

/// Stable identity of a connected user.
///
/// Unique for the lifetime of a connection and never reused, so it stays
/// valid as a key even when the user's nick changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A connected user as seen by the caller ID engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub nick: String,
    pub ident: String,
    /// Displayed host (may be cloaked).
    pub host: String,
    /// Connected to this server rather than relayed from another one.
    pub local: bool,
    /// User mode +g.
    pub callerid: bool,
    /// User mode +o.
    pub oper: bool,
}

impl User {
    /// `nick ident@host` mask used in the notice sent to a gated recipient.
    pub fn mask(&self) -> String {
        format!("{}@{}", self.ident, self.host)
    }
}

/// Private message or notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Privmsg,
    Notice,
}

impl MessageKind {
    pub fn command(&self) -> &'static str {
        match self {
            MessageKind::Privmsg => "PRIVMSG",
            MessageKind::Notice => "NOTICE",
        }
    }
}

/// Delivery decision for a private message or notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Deliver the message normally.
    Allow,
    /// Suppress delivery.
    Deny,
}

impl Decision {
    pub fn is_deny(&self) -> bool {
        matches!(self, Decision::Deny)
    }
}

/// Numeric replies emitted by the caller ID engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Numeric {
    /// RPL_ISUPPORT
    ISupport,
    /// ERR_NOSUCHNICK
    NoSuchNick,
    /// ERR_NEEDMOREPARAMS
    NeedMoreParams,
    /// RPL_ACCEPTLIST
    AcceptList,
    /// RPL_ENDOFACCEPT
    EndOfAccept,
    /// ERR_ACCEPTFULL
    AcceptFull,
    /// ERR_ACCEPTEXIST
    AcceptExist,
    /// ERR_ACCEPTNOT
    AcceptNot,
    /// ERR_TARGUMODEG
    TargUmodeG,
    /// RPL_TARGNOTIFY
    TargNotify,
    /// RPL_UMODEGMSG
    UmodeGMsg,
}

impl Numeric {
    /// Wire value of the numeric.
    pub fn code(&self) -> u16 {
        match self {
            Numeric::ISupport => 5,
            Numeric::NoSuchNick => 401,
            Numeric::NeedMoreParams => 461,
            Numeric::AcceptList => 281,
            Numeric::EndOfAccept => 282,
            Numeric::AcceptFull => 456,
            Numeric::AcceptExist => 457,
            Numeric::AcceptNot => 458,
            Numeric::TargUmodeG => 716,
            Numeric::TargNotify => 717,
            Numeric::UmodeGMsg => 718,
        }
    }
}

/// A numeric reply addressed to a single user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub target: UserId,
    pub numeric: Numeric,
    /// Middle parameters; the first is always the target's nick.
    pub params: Vec<String>,
    /// Trailing human-readable text.
    pub text: Option<String>,
}

impl Reply {
    pub fn new(target: &User, numeric: Numeric) -> Self {
        Self {
            target: target.id,
            numeric,
            params: vec![target.nick.clone()],
            text: None,
        }
    }

    pub fn param(mut self, param: impl Into<String>) -> Self {
        self.params.push(param.into());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

/// Destination for numeric replies.
pub trait ReplySink {
    fn send_reply(&mut self, reply: Reply);
}

impl ReplySink for Vec<Reply> {
    fn send_reply(&mut self, reply: Reply) {
        self.push(reply);
    }
}

/// Sink that drops every reply, for quiet internal actions.
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl ReplySink for Silent {
    fn send_reply(&mut self, _reply: Reply) {}
}

/// Read access to the set of connected users.
pub trait UserDirectory {
    /// Resolve a user by nick (case-insensitive).
    fn find_nick(&self, nick: &str) -> Option<&User>;

    /// Look up a user by stable identity.
    fn get(&self, id: UserId) -> Option<&User>;

    /// Identities of every connected user.
    fn user_ids(&self) -> Vec<UserId>;
}
