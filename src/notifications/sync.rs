//! Reconciliation of the cached collection with a fresh remote fetch.

use std::collections::HashMap;

use super::{Meta, Notifications};

/// Merge `local` (cache) with `remote` (fresh fetch).
///
/// The remote decides which notifications exist and what they contain; the
/// local copy decides their processing state.  Every remote entry whose id is
/// known locally gets the local [`Meta`] re-attached.  Entries that exist only
/// locally are dropped: if the remote stops returning a thread, it is gone
/// from the reconciled view.
///
/// When `local` holds the same id more than once, the flags of all copies
/// are combined, so a `done` or `to_delete` seen on any copy is kept.
pub fn sync(local: Notifications, remote: Notifications) -> Notifications {
    let mut known: HashMap<String, Meta> = HashMap::new();
    for n in local {
        known.entry(n.id).or_default().absorb(n.meta);
    }

    remote
        .into_iter()
        .map(|mut n| {
            if let Some(meta) = known.get(&n.id) {
                n.meta = *meta;
            }
            n
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::Notification;

    fn done(id: &str) -> Notification {
        let mut n = Notification::with_id(id);
        n.meta.done = true;
        n
    }

    #[test]
    fn local_meta_survives_refetch() {
        let local: Notifications = vec![done("A")].into();
        let mut fresh = Notification::with_id("A");
        fresh.subject.title = "new".into();
        let remote: Notifications = vec![fresh].into();

        let got = sync(local, remote);

        assert_eq!(got.len(), 1);
        assert_eq!(got[0].id, "A");
        assert!(got[0].meta.done);
        assert_eq!(got[0].subject.title, "new", "content comes from remote");
    }

    #[test]
    fn remote_content_replaces_local_content() {
        let mut old = Notification::with_id("A");
        old.subject.title = "old".into();
        old.unread = true;
        let mut fresh = Notification::with_id("A");
        fresh.subject.title = "new".into();

        let got = sync(vec![old].into(), vec![fresh].into());

        assert_eq!(got[0].subject.title, "new");
        assert!(!got[0].unread);
    }

    #[test]
    fn empty_remote_yields_empty_result() {
        let local: Notifications = vec![Notification::with_id("A")].into();
        assert!(sync(local, Notifications::new()).is_empty());
    }

    #[test]
    fn local_only_entries_are_dropped() {
        let local: Notifications = vec![done("A"), done("B")].into();
        let remote: Notifications = vec![Notification::with_id("B")].into();

        let got = sync(local, remote);

        assert_eq!(got.id_list(), vec!["B"]);
    }

    #[test]
    fn new_remote_entries_get_default_meta() {
        let got = sync(
            Notifications::new(),
            vec![Notification::with_id("N")].into(),
        );
        assert_eq!(got[0].meta, Meta::default());
    }

    #[test]
    fn remote_order_is_kept() {
        let local: Notifications = vec![done("c"), done("a")].into();
        let remote: Notifications = ["a", "b", "c"]
            .iter()
            .map(|id| Notification::with_id(*id))
            .collect();

        let got = sync(local, remote);

        assert_eq!(got.id_list(), vec!["a", "b", "c"]);
        assert!(got[0].meta.done);
        assert!(!got[1].meta.done);
        assert!(got[2].meta.done);
    }

    #[test]
    fn duplicate_local_copies_never_lose_a_flag() {
        let mut deleted = Notification::with_id("A");
        deleted.meta.to_delete = true;
        let local: Notifications = vec![done("A"), Notification::with_id("A"), deleted].into();

        let got = sync(local, vec![Notification::with_id("A")].into());

        assert!(got[0].meta.done);
        assert!(got[0].meta.to_delete);
    }

    #[test]
    fn sync_is_deterministic() {
        let local: Notifications = vec![done("x"), Notification::with_id("y")].into();
        let remote: Notifications = ["y", "x", "z"]
            .iter()
            .map(|id| Notification::with_id(*id))
            .collect();

        let first = sync(local.clone(), remote.clone());
        let second = sync(local, remote);

        assert_eq!(first, second);
    }
}
