//! Accept list cleanup on quit, nick change and module unload.

use tracing::debug;

use super::{AcceptCommand, AcceptStores};
use crate::domain::{Silent, UserDirectory, UserId};

/// Keeps accept lists free of references to users who are gone.
#[derive(Debug, Clone)]
pub struct LifecycleCoordinator {
    track_nick: bool,
}

impl LifecycleCoordinator {
    pub fn new(track_nick: bool) -> Self {
        Self { track_nick }
    }

    /// Called before `who` is removed from the directory.
    ///
    /// Drops the user's own record and erases them from every other list.
    /// Returns the number of lists the user was removed from.
    pub fn on_user_quit(
        &self,
        stores: &mut AcceptStores,
        users: &dyn UserDirectory,
        who: UserId,
    ) -> usize {
        stores.remove(who);
        Self::remove_from_all_accepts(stores, users, who)
    }

    /// Called before `who` changes nick.
    ///
    /// Without nick tracking, accepting someone only lasts until they change
    /// nick.
    pub fn on_user_pre_nick(
        &self,
        stores: &mut AcceptStores,
        users: &dyn UserDirectory,
        who: UserId,
    ) -> usize {
        if self.track_nick {
            return 0;
        }
        Self::remove_from_all_accepts(stores, users, who)
    }

    /// Release every record at once on module unload.
    ///
    /// Linear in the number of records, unlike running the quit sweep for
    /// each user.
    pub fn on_cleanup(&self, stores: &mut AcceptStores) -> usize {
        let released = stores.clear();
        debug!(released, "Released all accept lists");
        released
    }

    /// Erase `who` from the list of every connected user.
    pub fn remove_from_all_accepts(
        stores: &mut AcceptStores,
        users: &dyn UserDirectory,
        who: UserId,
    ) -> usize {
        if stores.is_empty() {
            return 0;
        }
        let Some(target) = users.get(who) else {
            return 0;
        };

        let mut purged = 0;
        for owner_id in users.user_ids() {
            let has_entries = stores.peek(owner_id).is_some_and(|store| !store.is_empty());
            if owner_id == who || !has_entries {
                continue;
            }
            let Some(owner) = users.get(owner_id) else {
                continue;
            };
            if AcceptCommand::remove_accept(stores, owner, target, &mut Silent).is_ok() {
                purged += 1;
            }
        }

        debug!(user = %target.nick, purged, "Removed user from accept lists");
        purged
    }
}
