//! Per-user accept list storage.

use std::collections::{BTreeSet, HashMap};

use crate::domain::UserId;

/// Accept list and notification state for one user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AcceptListStore {
    accepted: BTreeSet<UserId>,
    /// `None` until the first throttled notification is sent.
    last_notify: Option<u64>,
}

impl AcceptListStore {
    pub fn contains(&self, sender: UserId) -> bool {
        self.accepted.contains(&sender)
    }

    /// Insert a sender. Returns `false` if already present.
    pub fn insert(&mut self, sender: UserId) -> bool {
        self.accepted.insert(sender)
    }

    /// Remove a sender. Returns `false` if not present.
    pub fn remove(&mut self, sender: UserId) -> bool {
        self.accepted.remove(&sender)
    }

    pub fn len(&self) -> usize {
        self.accepted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty()
    }

    /// Accepted senders in connection order.
    pub fn iter(&self) -> impl Iterator<Item = UserId> + '_ {
        self.accepted.iter().copied()
    }

    pub fn last_notify(&self) -> Option<u64> {
        self.last_notify
    }

    /// Whether a notification at `now` is outside the cooldown window.
    pub fn notify_due(&self, now: u64, cooldown: u64) -> bool {
        match self.last_notify {
            None => true,
            Some(last) => now > last.saturating_add(cooldown),
        }
    }

    /// Record a notification sent at `now`. Never moves backwards.
    pub fn mark_notified(&mut self, now: u64) {
        self.last_notify = Some(self.last_notify.map_or(now, |last| last.max(now)));
    }
}

/// All accept list records, keyed by owner identity.
///
/// A user has at most one record. Records are created lazily on request.
#[derive(Debug, Default)]
pub struct AcceptStores {
    stores: HashMap<UserId, AcceptListStore>,
}

impl AcceptStores {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the owner's record, creating an empty one if `create` is set.
    pub fn get(&mut self, owner: UserId, create: bool) -> Option<&mut AcceptListStore> {
        if create {
            Some(self.stores.entry(owner).or_default())
        } else {
            self.stores.get_mut(&owner)
        }
    }

    /// Read-only lookup that never creates.
    pub fn peek(&self, owner: UserId) -> Option<&AcceptListStore> {
        self.stores.get(&owner)
    }

    /// Delete the owner's record. Returns `false` if there was none.
    pub fn remove(&mut self, owner: UserId) -> bool {
        self.stores.remove(&owner).is_some()
    }

    /// Delete every record. Returns how many were released.
    pub fn clear(&mut self) -> usize {
        let released = self.stores.len();
        self.stores.clear();
        released
    }

    pub fn len(&self) -> usize {
        self.stores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }
}
