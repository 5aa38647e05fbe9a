//! Ordered rules and the engine that dispatches them to actors.
//!
//! Rules run strictly in configured order against the whole collection.  A
//! rule's actions finish before the next rule is evaluated, so later rules
//! see the `meta` updates of earlier ones.

mod filter;

pub use filter::Filter;

use std::io::Write;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::actors::{Actor, Registry};
use crate::notifications::{Notification, Notifications};

/// Binds a filter to an action name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Shown in logs only.
    pub name: String,
    /// Key into the actor [`Registry`].
    pub action: String,
    #[serde(default)]
    pub filter: Filter,
}

/// What happened during one [`Engine::apply`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    /// Actor invocations that succeeded.
    pub ran: usize,
    pub failed: usize,
    /// Matches skipped because they were already done.
    pub skipped: usize,
    /// Matches reported but not acted on in dry-run mode.
    pub dry_run: usize,
    /// Rules whose action is not registered.
    pub unresolved: usize,
}

impl Summary {
    pub fn invocations(&self) -> usize {
        self.ran + self.failed
    }
}

pub struct Engine<'a> {
    rules: &'a [Rule],
    actors: &'a Registry,
    dry_run: bool,
}

/// Run one actor and record success on the notification.
///
/// This is the only place `meta.done` is set, for both rules and the
/// interactive view.
pub fn run_action(actor: &dyn Actor, notification: &mut Notification) -> Result<String> {
    let line = actor.run(notification)?;
    notification.meta.done = true;
    Ok(line)
}

fn emit(out: &mut dyn Write, line: &str) {
    if let Err(e) = writeln!(out, "{line}") {
        warn!(error = %e, "cannot write action output");
    }
}

impl<'a> Engine<'a> {
    pub fn new(rules: &'a [Rule], actors: &'a Registry) -> Self {
        Self {
            rules,
            actors,
            dry_run: false,
        }
    }

    /// Report what would run instead of running it.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Apply every rule in order, then compact.
    ///
    /// Action output lines go to `out`.  Per-notification failures are logged
    /// and counted; they never stop the remaining work.
    pub fn apply(
        &self,
        mut notifications: Notifications,
        out: &mut dyn Write,
    ) -> (Notifications, Summary) {
        let mut summary = Summary::default();

        for rule in self.rules {
            let Some(actor) = self.actors.get(&rule.action) else {
                warn!(rule = %rule.name, action = %rule.action, "unknown action, skipping rule");
                summary.unresolved += 1;
                continue;
            };

            let ids = rule.filter.select(&notifications);
            debug!(rule = %rule.name, count = ids.len(), "apply rule");

            if self.dry_run {
                for notification in notifications.filter_from_ids(&ids).iter() {
                    if notification.meta.done {
                        summary.skipped += 1;
                        continue;
                    }
                    emit(
                        out,
                        &format!("NOOP'ing action {} on notification {notification}", rule.action),
                    );
                    summary.dry_run += 1;
                }
                continue;
            }

            for notification in notifications.filter_from_ids_mut(&ids) {
                if notification.meta.done {
                    summary.skipped += 1;
                    continue;
                }

                match run_action(actor.as_ref(), notification) {
                    Ok(line) => {
                        emit(out, &line);
                        summary.ran += 1;
                    }
                    Err(e) => {
                        let message = format!("{e:#}");
                        error!(
                            action = %rule.action,
                            id = %notification.id,
                            error = %message,
                            "action failed"
                        );
                        summary.failed += 1;
                    }
                }
            }
        }

        (notifications.compact(), summary)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
