//! ACCEPT command implementation.
//!
//! Users manage their accept list even while not +g, so the list is ready
//! when they turn caller ID on.

use tracing::debug;

use super::AcceptStores;
use crate::domain::parser::{split_accept_args, AcceptToken};
use crate::domain::{CallerIdError, Numeric, Reply, ReplySink, User, UserDirectory};

/// Result of one ACCEPT invocation, one entry per token processed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutcome {
    pub results: Vec<(AcceptToken, Result<(), CallerIdError>)>,
}

impl CommandOutcome {
    /// True if any token failed to apply.
    pub fn is_failure(&self) -> bool {
        self.results.iter().any(|(_, r)| r.is_err())
    }

    /// Number of additions and removals that changed the list.
    pub fn changes(&self) -> usize {
        self.results
            .iter()
            .filter(|(token, r)| r.is_ok() && !matches!(token, AcceptToken::List))
            .count()
    }

    pub fn errors(&self) -> impl Iterator<Item = &CallerIdError> {
        self.results.iter().filter_map(|(_, r)| r.as_ref().err())
    }
}

/// The ACCEPT command.
#[derive(Debug, Clone)]
pub struct AcceptCommand {
    max_accepts: usize,
}

impl AcceptCommand {
    pub fn new(max_accepts: usize) -> Self {
        Self { max_accepts }
    }

    /// Process every token in `args` for `invoker`.
    ///
    /// A failing token is reported to the invoker and the remaining tokens
    /// are still processed.
    pub fn handle<S: AsRef<str>>(
        &self,
        stores: &mut AcceptStores,
        users: &dyn UserDirectory,
        invoker: &User,
        args: &[S],
        replies: &mut dyn ReplySink,
    ) -> CommandOutcome {
        let mut outcome = CommandOutcome::default();

        for raw in split_accept_args(args) {
            let token = AcceptToken::classify(raw);
            let result = match &token {
                AcceptToken::List => {
                    if invoker.local {
                        Self::list_accept(stores, users, invoker, replies);
                        Ok(())
                    } else {
                        Err(CallerIdError::NotPermitted(
                            "accept list can only be listed locally".to_string(),
                        ))
                    }
                }
                AcceptToken::Remove(nick) => match users.find_nick(nick) {
                    Some(target) => Self::remove_accept(stores, invoker, target, replies),
                    None => Err(CallerIdError::TargetNotFound(nick.clone())),
                },
                AcceptToken::Add(nick) => match users.find_nick(nick) {
                    Some(target) => self.add_accept(stores, invoker, target, replies),
                    None => {
                        // Echo the token as typed, prefix included
                        replies.send_reply(
                            Reply::new(invoker, Numeric::NoSuchNick)
                                .param(raw)
                                .text("No such nick/channel"),
                        );
                        Err(CallerIdError::TargetNotFound(nick.clone()))
                    }
                },
            };
            outcome.results.push((token, result));
        }

        debug!(
            invoker = %invoker.nick,
            tokens = outcome.results.len(),
            changes = outcome.changes(),
            errors = outcome.errors().count(),
            "ACCEPT processed"
        );
        outcome
    }

    /// Send one 281 per accepted sender followed by a single 282.
    pub fn list_accept(
        stores: &AcceptStores,
        users: &dyn UserDirectory,
        invoker: &User,
        replies: &mut dyn ReplySink,
    ) {
        if let Some(store) = stores.peek(invoker.id) {
            for accepted in store.iter().filter_map(|id| users.get(id)) {
                replies.send_reply(Reply::new(invoker, Numeric::AcceptList).param(&accepted.nick));
            }
        }
        replies.send_reply(Reply::new(invoker, Numeric::EndOfAccept).text("End of ACCEPT list"));
    }

    /// Add `target` to the invoker's list, creating the list on demand.
    pub fn add_accept(
        &self,
        stores: &mut AcceptStores,
        invoker: &User,
        target: &User,
        replies: &mut dyn ReplySink,
    ) -> Result<(), CallerIdError> {
        // Capacity and duplicate checks before creation, so a rejected add
        // leaves no empty record behind
        let (len, present) = stores
            .peek(invoker.id)
            .map_or((0, false), |store| (store.len(), store.contains(target.id)));

        if len >= self.max_accepts {
            replies.send_reply(
                Reply::new(invoker, Numeric::AcceptFull)
                    .text(format!("Accept list is full (limit is {})", self.max_accepts)),
            );
            return Err(CallerIdError::CapacityExceeded(self.max_accepts));
        }
        if present {
            replies.send_reply(
                Reply::new(invoker, Numeric::AcceptExist)
                    .param(&target.nick)
                    .text("is already on your accept list"),
            );
            return Err(CallerIdError::DuplicateEntry(target.nick.clone()));
        }

        if let Some(store) = stores.get(invoker.id, true) {
            store.insert(target.id);
        }
        Ok(())
    }

    /// Remove `target` from the invoker's list.
    ///
    /// Pass [`Silent`](crate::domain::Silent) as `replies` for a quiet removal.
    pub fn remove_accept(
        stores: &mut AcceptStores,
        invoker: &User,
        target: &User,
        replies: &mut dyn ReplySink,
    ) -> Result<(), CallerIdError> {
        let removed = stores
            .get(invoker.id, false)
            .is_some_and(|store| store.remove(target.id));
        if removed {
            return Ok(());
        }

        replies.send_reply(
            Reply::new(invoker, Numeric::AcceptNot)
                .param(&target.nick)
                .text("is not on your accept list"),
        );
        Err(CallerIdError::NotPresent(target.nick.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::registry::testing::{local, remote, user};
    use crate::domain::{Silent, UserId, UserRegistry};

    fn codes(replies: &[Reply]) -> Vec<u16> {
        replies.iter().map(|r| r.numeric.code()).collect()
    }

    fn setup(nicks: &[&str]) -> (UserRegistry, Vec<UserId>) {
        let mut registry = UserRegistry::new();
        let ids = nicks.iter().map(|n| local(&mut registry, n)).collect();
        (registry, ids)
    }

    #[test]
    fn test_add_then_list() {
        let (registry, ids) = setup(&["alice", "bob", "carol"]);
        let alice = user(&registry, ids[0]);
        let mut stores = AcceptStores::new();
        let mut replies = Vec::new();

        let outcome = AcceptCommand::new(16).handle(
            &mut stores,
            &registry,
            &alice,
            &["bob,+carol", "*"],
            &mut replies,
        );

        assert!(!outcome.is_failure());
        assert_eq!(outcome.changes(), 2);
        assert_eq!(codes(&replies), vec![281, 281, 282]);
        assert_eq!(replies[0].params, vec!["alice", "bob"]);
        assert_eq!(replies[1].params, vec!["alice", "carol"]);
        assert!(replies.iter().all(|r| r.target == alice.id));
    }

    #[test]
    fn test_list_empty_sends_only_end() {
        let (registry, ids) = setup(&["alice"]);
        let alice = user(&registry, ids[0]);
        let mut stores = AcceptStores::new();
        let mut replies = Vec::new();

        AcceptCommand::new(16).handle(&mut stores, &registry, &alice, &["*"], &mut replies);

        assert_eq!(codes(&replies), vec![282]);
        assert_eq!(replies[0].text.as_deref(), Some("End of ACCEPT list"));
        // Listing never creates a record
        assert!(stores.is_empty());
    }

    #[test]
    fn test_remote_list_is_dropped() {
        let mut registry = UserRegistry::new();
        let id = remote(&mut registry, "faraway");
        let invoker = user(&registry, id);
        let mut stores = AcceptStores::new();
        let mut replies = Vec::new();

        let outcome =
            AcceptCommand::new(16).handle(&mut stores, &registry, &invoker, &["*"], &mut replies);

        assert!(replies.is_empty());
        assert!(matches!(
            outcome.results[0].1,
            Err(CallerIdError::NotPermitted(_))
        ));
    }

    #[test]
    fn test_add_unknown_nick() {
        let (registry, ids) = setup(&["alice"]);
        let alice = user(&registry, ids[0]);
        let mut stores = AcceptStores::new();
        let mut replies = Vec::new();

        let outcome =
            AcceptCommand::new(16).handle(&mut stores, &registry, &alice, &["ghost"], &mut replies);

        assert!(outcome.is_failure());
        assert_eq!(codes(&replies), vec![401]);
        assert_eq!(replies[0].params, vec!["alice", "ghost"]);
        assert!(stores.is_empty());
    }

    #[test]
    fn test_add_unknown_nick_echoes_token_as_typed() {
        let (registry, ids) = setup(&["alice"]);
        let alice = user(&registry, ids[0]);
        let mut stores = AcceptStores::new();
        let mut replies = Vec::new();

        AcceptCommand::new(16).handle(&mut stores, &registry, &alice, &["+ghost"], &mut replies);

        assert_eq!(codes(&replies), vec![401]);
        assert_eq!(replies[0].params, vec!["alice", "+ghost"]);
    }

    #[test]
    fn test_duplicate_add() {
        let (registry, ids) = setup(&["alice", "bob"]);
        let alice = user(&registry, ids[0]);
        let mut stores = AcceptStores::new();
        let mut replies = Vec::new();
        let command = AcceptCommand::new(16);

        command.handle(&mut stores, &registry, &alice, &["bob"], &mut replies);
        let outcome = command.handle(&mut stores, &registry, &alice, &["BOB"], &mut replies);

        assert!(outcome.is_failure());
        assert_eq!(
            outcome.results[0].1,
            Err(CallerIdError::DuplicateEntry("bob".to_string()))
        );
        assert_eq!(codes(&replies), vec![457]);
        assert_eq!(stores.peek(alice.id).unwrap().len(), 1);
    }

    #[test]
    fn test_capacity_scenario() {
        let (registry, ids) = setup(&["a", "b", "c", "d"]);
        let a = user(&registry, ids[0]);
        let mut stores = AcceptStores::new();
        let mut replies = Vec::new();
        let command = AcceptCommand::new(2);

        let outcome = command.handle(&mut stores, &registry, &a, &["b", "c"], &mut replies);
        assert!(!outcome.is_failure());

        let outcome = command.handle(&mut stores, &registry, &a, &["d"], &mut replies);
        assert_eq!(
            outcome.results[0].1,
            Err(CallerIdError::CapacityExceeded(2))
        );
        assert_eq!(codes(&replies), vec![456]);
        assert_eq!(
            replies[0].text.as_deref(),
            Some("Accept list is full (limit is 2)")
        );
        assert_eq!(stores.peek(a.id).unwrap().len(), 2);

        let outcome = command.handle(&mut stores, &registry, &a, &["-b"], &mut replies);
        assert!(!outcome.is_failure());
        let outcome = command.handle(&mut stores, &registry, &a, &["d"], &mut replies);
        assert!(!outcome.is_failure());

        let store = stores.peek(a.id).unwrap();
        assert!(store.contains(ids[2]) && store.contains(ids[3]));
        assert!(!store.contains(ids[1]));
    }

    #[test]
    fn test_lowered_cap_is_not_retroactive() {
        let (registry, ids) = setup(&["a", "b", "c", "d"]);
        let a = user(&registry, ids[0]);
        let mut stores = AcceptStores::new();
        let mut replies = Vec::new();

        AcceptCommand::new(3).handle(&mut stores, &registry, &a, &["b,c,d"], &mut replies);
        assert_eq!(stores.peek(a.id).unwrap().len(), 3);

        let outcome =
            AcceptCommand::new(1).handle(&mut stores, &registry, &a, &["-b"], &mut replies);
        assert!(!outcome.is_failure());
        assert_eq!(stores.peek(a.id).unwrap().len(), 2);
    }

    #[test]
    fn test_remove_without_record_does_not_create() {
        let (registry, ids) = setup(&["alice", "bob"]);
        let alice = user(&registry, ids[0]);
        let mut stores = AcceptStores::new();
        let mut replies = Vec::new();

        let outcome =
            AcceptCommand::new(16).handle(&mut stores, &registry, &alice, &["-bob"], &mut replies);

        assert_eq!(
            outcome.results[0].1,
            Err(CallerIdError::NotPresent("bob".to_string()))
        );
        assert_eq!(codes(&replies), vec![458]);
        assert_eq!(replies[0].params, vec!["alice", "bob"]);
        assert!(stores.is_empty());
    }

    #[test]
    fn test_remove_unknown_nick_is_silent() {
        let (registry, ids) = setup(&["alice"]);
        let alice = user(&registry, ids[0]);
        let mut stores = AcceptStores::new();
        let mut replies = Vec::new();

        let outcome = AcceptCommand::new(16).handle(
            &mut stores,
            &registry,
            &alice,
            &["-ghost"],
            &mut replies,
        );

        assert!(replies.is_empty());
        assert_eq!(
            outcome.results[0].1,
            Err(CallerIdError::TargetNotFound("ghost".to_string()))
        );
    }

    #[test]
    fn test_quiet_remove_sends_nothing() {
        let (registry, ids) = setup(&["alice", "bob"]);
        let alice = user(&registry, ids[0]);
        let bob = user(&registry, ids[1]);
        let mut stores = AcceptStores::new();

        let result = AcceptCommand::remove_accept(&mut stores, &alice, &bob, &mut Silent);
        assert!(matches!(result, Err(CallerIdError::NotPresent(_))));
    }

    #[test]
    fn test_mixed_batch_continues_after_failure() {
        let (registry, ids) = setup(&["alice", "bob", "carol"]);
        let alice = user(&registry, ids[0]);
        let mut stores = AcceptStores::new();
        let mut replies = Vec::new();

        let outcome = AcceptCommand::new(16).handle(
            &mut stores,
            &registry,
            &alice,
            &["bob,ghost,carol,bob"],
            &mut replies,
        );

        assert!(outcome.is_failure());
        assert_eq!(outcome.changes(), 2);
        assert_eq!(outcome.errors().count(), 2);
        assert_eq!(codes(&replies), vec![401, 457]);
        assert_eq!(stores.peek(alice.id).unwrap().len(), 2);
    }

    #[test]
    fn test_entries_follow_identity_not_nick() {
        let (mut registry, ids) = setup(&["alice", "bob"]);
        let alice = user(&registry, ids[0]);
        let mut stores = AcceptStores::new();
        let mut replies = Vec::new();
        let command = AcceptCommand::new(16);

        command.handle(&mut stores, &registry, &alice, &["bob"], &mut replies);
        registry.rename(ids[1], "robert").unwrap();
        command.handle(&mut stores, &registry, &alice, &["*"], &mut replies);

        assert_eq!(codes(&replies), vec![281, 282]);
        assert_eq!(replies[0].params, vec!["alice", "robert"]);
    }
}
