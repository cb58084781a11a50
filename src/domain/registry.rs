//! In-memory user registry.
//!
//! Assigns stable identities to connections and resolves nicks using the
//! RFC 1459 case mapping (`[]\~` fold to `{}|^`).

use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

use anyhow::{bail, Result};
use regex::Regex;

use super::types::{User, UserDirectory, UserId};

/// Nick syntax: a letter or special first, then letters, digits, specials or `-`.
const NICK_PATTERN: &str = r"^[A-Za-z\[\]\\`_^{|}][A-Za-z0-9\[\]\\`_^{|}-]{0,29}$";

fn nick_regex() -> &'static Regex {
    static NICK_RE: OnceLock<Regex> = OnceLock::new();
    NICK_RE.get_or_init(|| Regex::new(NICK_PATTERN).expect("nick pattern is valid"))
}

/// Check whether `nick` is syntactically valid.
pub fn is_valid_nick(nick: &str) -> bool {
    nick_regex().is_match(nick)
}

/// Fold a nick to its RFC 1459 canonical form.
pub fn irc_lower(nick: &str) -> String {
    nick.chars()
        .map(|c| match c {
            '[' => '{',
            ']' => '}',
            '\\' => '|',
            '~' => '^',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

/// Attributes of a new connection.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub nick: String,
    pub ident: String,
    pub host: String,
    pub local: bool,
    pub oper: bool,
}

/// Registry of connected users, indexed by identity and folded nick.
#[derive(Debug, Default)]
pub struct UserRegistry {
    users: BTreeMap<UserId, User>,
    nicks: HashMap<String, UserId>,
    next_id: u64,
}

impl UserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection and return its identity.
    pub fn connect(&mut self, new_user: NewUser) -> Result<UserId> {
        if !is_valid_nick(&new_user.nick) {
            bail!("Erroneous nickname: {}", new_user.nick);
        }
        let folded = irc_lower(&new_user.nick);
        if self.nicks.contains_key(&folded) {
            bail!("Nickname is already in use: {}", new_user.nick);
        }

        self.next_id += 1;
        let id = UserId(self.next_id);
        self.nicks.insert(folded, id);
        self.users.insert(
            id,
            User {
                id,
                nick: new_user.nick,
                ident: new_user.ident,
                host: new_user.host,
                local: new_user.local,
                callerid: false,
                oper: new_user.oper,
            },
        );
        Ok(id)
    }

    /// Check whether `id` may take `new_nick`.
    ///
    /// A case-only change of the user's own nick is allowed.
    pub fn check_rename(&self, id: UserId, new_nick: &str) -> Result<()> {
        if !is_valid_nick(new_nick) {
            bail!("Erroneous nickname: {}", new_nick);
        }
        match self.nicks.get(&irc_lower(new_nick)) {
            Some(owner) if *owner != id => bail!("Nickname is already in use: {}", new_nick),
            _ => Ok(()),
        }
    }

    /// Change a user's nick. The identity is unchanged.
    pub fn rename(&mut self, id: UserId, new_nick: &str) -> Result<()> {
        self.check_rename(id, new_nick)?;
        let Some(user) = self.users.get_mut(&id) else {
            bail!("Unknown user {}", id);
        };
        self.nicks.remove(&irc_lower(&user.nick));
        self.nicks.insert(irc_lower(new_nick), id);
        user.nick = new_nick.to_string();
        Ok(())
    }

    /// Remove a user. Returns the removed record.
    pub fn disconnect(&mut self, id: UserId) -> Option<User> {
        let user = self.users.remove(&id)?;
        self.nicks.remove(&irc_lower(&user.nick));
        Some(user)
    }

    /// Apply a mode string such as `+g`, `-g` or `+g-o`.
    ///
    /// Returns the mode characters that were not recognised.
    pub fn apply_modes(&mut self, id: UserId, modes: &str) -> Result<Vec<char>> {
        let Some(user) = self.users.get_mut(&id) else {
            bail!("Unknown user {}", id);
        };

        let mut adding = true;
        let mut unknown = Vec::new();
        for c in modes.chars() {
            match c {
                '+' => adding = true,
                '-' => adding = false,
                'g' => user.callerid = adding,
                'o' => user.oper = adding,
                other => unknown.push(other),
            }
        }
        Ok(unknown)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl UserDirectory for UserRegistry {
    fn find_nick(&self, nick: &str) -> Option<&User> {
        self.nicks
            .get(&irc_lower(nick))
            .and_then(|id| self.users.get(id))
    }

    fn get(&self, id: UserId) -> Option<&User> {
        self.users.get(&id)
    }

    fn user_ids(&self) -> Vec<UserId> {
        self.users.keys().copied().collect()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Connect a local user with default ident/host.
    pub fn local(registry: &mut UserRegistry, nick: &str) -> UserId {
        registry
            .connect(NewUser {
                nick: nick.to_string(),
                ident: nick.to_string(),
                host: format!("{}.example.org", nick),
                local: true,
                oper: false,
            })
            .unwrap()
    }

    /// Connect a user relayed from another server.
    pub fn remote(registry: &mut UserRegistry, nick: &str) -> UserId {
        registry
            .connect(NewUser {
                nick: nick.to_string(),
                ident: nick.to_string(),
                host: "remote.example.org".to_string(),
                local: false,
                oper: false,
            })
            .unwrap()
    }

    /// Clone a user out of the registry.
    pub fn user(registry: &UserRegistry, id: UserId) -> User {
        registry.get(id).cloned().unwrap()
    }
}
