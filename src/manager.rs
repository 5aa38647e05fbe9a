//! Per-run orchestration: load, refresh, apply rules, save.
//!
//! The manager owns the working collection for the whole run.  Reconciliation
//! and the rule engine take it by value and hand back the updated collection,
//! so there is exactly one live copy at any time.

use std::collections::HashSet;
use std::io::Write;
use std::mem;

use tracing::{debug, info, warn};

use crate::cache::ExpiringCache;
use crate::error::{CacheError, FetchError};
use crate::notifications::{sync, NotificationMap, Notifications};
use crate::remote::NotificationSource;
use crate::rules::{Engine, Summary};

/// Whether a run should hit the remote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RefreshStrategy {
    /// Refresh only when the cache has expired.
    #[default]
    Default,
    /// Always refresh.
    Force,
    /// Never refresh, even from an expired cache.
    Never,
}

impl RefreshStrategy {
    pub fn from_flags(refresh: bool, no_refresh: bool) -> Self {
        if refresh {
            Self::Force
        } else if no_refresh {
            Self::Never
        } else {
            Self::Default
        }
    }
}

pub struct Manager {
    notifications: Notifications,
    cache: Box<dyn ExpiringCache>,
    source: Box<dyn NotificationSource>,
    refresh: RefreshStrategy,
}

impl Manager {
    pub fn new(
        cache: Box<dyn ExpiringCache>,
        source: Box<dyn NotificationSource>,
        refresh: RefreshStrategy,
    ) -> Self {
        Self {
            notifications: Notifications::new(),
            cache,
            source,
            refresh,
        }
    }

    pub fn notifications(&self) -> &Notifications {
        &self.notifications
    }

    /// Hand the working collection to someone else (the interactive view).
    /// Give it back with [`replace`](Self::replace) before saving.
    pub fn take(&mut self) -> Notifications {
        mem::take(&mut self.notifications)
    }

    pub fn replace(&mut self, notifications: Notifications) {
        self.notifications = notifications;
    }

    /// Build the working collection from the cache and, if due, the remote.
    ///
    /// Cache problems are logged and tolerated.  A failed fetch is returned
    /// as-is: there is no silent fallback to stale data.
    pub fn load(&mut self) -> Result<(), FetchError> {
        let expired = match self.cache.expired() {
            Ok(expired) => expired,
            Err(e @ CacheError::Missing { .. }) => {
                debug!(error = %e, "no cache yet");
                true
            }
            Err(e) => {
                warn!(error = %e, "cannot determine cache age, treating it as expired");
                true
            }
        };

        let mut all = self.cache.read().unwrap_or_else(|e| {
            warn!(error = %e, "cannot read the cache");
            Notifications::new()
        });

        if self.should_refresh(expired) {
            info!(source = self.source.name(), "refreshing the cache");
            let remote = self.source.fetch()?;
            let known = all.map();
            all = sync(all, remote);
            log_dropped(known, &all);

            if let Err(e) = self.cache.write(&all) {
                warn!(error = %e, "cannot write the cache");
            }
        }

        self.notifications = all.uniq();
        Ok(())
    }

    fn should_refresh(&self, expired: bool) -> bool {
        match self.refresh {
            RefreshStrategy::Force if !expired => {
                info!("forcing a refresh");
                true
            }
            RefreshStrategy::Never if expired => {
                info!("preventing a refresh");
                false
            }
            _ => {
                debug!(refresh = expired, "refresh decision");
                expired
            }
        }
    }

    /// Run the rules over the working collection.
    pub fn apply(&mut self, engine: &Engine<'_>, out: &mut dyn Write) -> Summary {
        let (updated, summary) = engine.apply(self.take(), out);
        self.notifications = updated;
        summary
    }

    /// Persist the compacted working collection.  This is the only place
    /// entries marked `to_delete` leave durable state.
    pub fn save(&mut self) -> Result<(), CacheError> {
        self.notifications = self.take().compact();
        self.cache.write(&self.notifications)
    }

    /// [`save`](Self::save) at the end of a run.  Actions have already
    /// happened upstream by then, so a failed write is only a warning.
    /// Returns whether the snapshot was written.
    pub fn persist(&mut self) -> bool {
        match self.save() {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "cannot write the cache");
                false
            }
        }
    }
}

/// Report cached threads the remote no longer returns; sync drops them.
fn log_dropped(known: NotificationMap, merged: &Notifications) {
    let kept: HashSet<String> = merged.id_list().into_iter().collect();
    let dropped: Vec<String> = known
        .list()
        .id_list()
        .into_iter()
        .filter(|id| !kept.contains(id))
        .collect();
    if !dropped.is_empty() {
        info!(count = dropped.len(), ids = ?dropped, "dropped threads the remote no longer returns");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
