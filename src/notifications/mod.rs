//! Notification data model and the collection algebra over it.
//!
//! [`Notifications`] is an ordered sequence; insertion order drives display
//! order and "first occurrence wins" de-duplication.  [`NotificationMap`] is
//! the keyed view used for reconciliation.
//!
//! Every operation here is pure and total: empty input yields empty output,
//! never an error.

mod notification;
mod sync;

pub use notification::{Meta, Notification, Repository, Subject, User};
pub use sync::sync;

use std::collections::{HashMap, HashSet};
use std::ops::Deref;

use serde::{Deserialize, Deserializer, Serialize};

/// An ordered collection of notifications.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Notifications(Vec<Notification>);

/// Notifications keyed by id.  Iteration order is unspecified.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationMap(HashMap<String, Notification>);

impl Notifications {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, other: Notifications) {
        self.0.extend(other.0);
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Notification> {
        self.0.iter_mut()
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Notification> {
        self.0.get_mut(index)
    }

    /// Drop entries marked `to_delete`, keeping the relative order of the rest.
    ///
    /// Null entries cannot exist in memory: they are discarded when a payload
    /// is decoded (see the `Deserialize` impl below).
    pub fn compact(self) -> Self {
        self.0.into_iter().filter(|n| !n.meta.to_delete).collect()
    }

    /// Keep the first occurrence of every id, in first-occurrence order.
    pub fn uniq(self) -> Self {
        let mut seen = HashSet::new();
        self.0
            .into_iter()
            .filter(|n| seen.insert(n.id.clone()))
            .collect()
    }

    /// Key the collection by id.  With duplicate ids the last one wins.
    pub fn map(&self) -> NotificationMap {
        NotificationMap(
            self.0
                .iter()
                .map(|n| (n.id.clone(), n.clone()))
                .collect(),
        )
    }

    pub fn id_list(&self) -> Vec<String> {
        self.0.iter().map(|n| n.id.clone()).collect()
    }

    /// Notifications whose id is in `ids`, in this collection's order (not the
    /// order of `ids`).
    pub fn filter_from_ids(&self, ids: &[String]) -> Notifications {
        let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
        self.0
            .iter()
            .filter(|n| wanted.contains(n.id.as_str()))
            .cloned()
            .collect()
    }

    /// Mutable counterpart of [`filter_from_ids`](Self::filter_from_ids), used
    /// when the caller needs to update `meta` on the selected entries.
    pub fn filter_from_ids_mut(
        &mut self,
        ids: &[String],
    ) -> impl Iterator<Item = &mut Notification> + '_ {
        let wanted: HashSet<String> = ids.iter().cloned().collect();
        self.0
            .iter_mut()
            .filter(move |n| wanted.contains(&n.id))
    }

    /// Sort by id, for callers that need a deterministic order after
    /// round-tripping through a [`NotificationMap`].
    #[cfg(test)]
    pub fn sort(&mut self) {
        self.0.sort_by(|a, b| a.id.cmp(&b.id));
    }

}

impl NotificationMap {
    #[cfg(test)]
    pub fn get(&self, id: &str) -> Option<&Notification> {
        self.0.get(id)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Flatten back into a sequence.  The order is unspecified.
    pub fn list(self) -> Notifications {
        self.0.into_values().collect()
    }
}

impl Deref for Notifications {
    type Target = [Notification];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<Notification>> for Notifications {
    fn from(list: Vec<Notification>) -> Self {
        Self(list)
    }
}

impl FromIterator<Notification> for Notifications {
    fn from_iter<I: IntoIterator<Item = Notification>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Notifications {
    type Item = Notification;
    type IntoIter = std::vec::IntoIter<Notification>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Notifications {
    type Item = &'a Notification;
    type IntoIter = std::slice::Iter<'a, Notification>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<(String, Notification)> for NotificationMap {
    fn from_iter<I: IntoIterator<Item = (String, Notification)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// Payloads (API pages and old cache files alike) may contain `null` entries;
// they are dropped here so the rest of the crate never has to see them.
impl<'de> Deserialize<'de> for Notifications {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = Vec::<Option<Notification>>::deserialize(deserializer)?;
        Ok(entries.into_iter().flatten().collect())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------


// ---------------------------------------------------------------------------
// Generated inputs and algebraic laws
// ---------------------------------------------------------------------------
