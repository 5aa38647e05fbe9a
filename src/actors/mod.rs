//! Actions a rule can run against a notification.
//!
//! This module defines the [`Actor`] trait and the registry the rule engine
//! resolves action names against.  Concrete actors live in sub-modules.
//!
//! ## For contributors: adding a new action
//!
//! 1. Create a new file in this directory (e.g. `star.rs`).
//! 2. Define a struct holding whatever it needs (usually the shared
//!    [`Client`]) and implement [`Actor`] for it.
//! 3. Register it under its action name in [`registry`].
//!
//! Actors never set `meta.done`; the engine does that after a successful run.
//! They may set `meta.to_delete` when the thread should leave the cache.

mod done;
mod print;
mod read;
mod unsubscribe;

pub use done::Done;
pub use print::Print;
pub use read::Read;
pub use unsubscribe::Unsubscribe;

use std::collections::HashMap;
use std::rc::Rc;

use anyhow::Result;

use crate::notifications::Notification;
use crate::remote::Client;

/// One kind of side effect, applied to one notification at a time.
pub trait Actor {
    /// Perform the action and return a line describing what happened.
    fn run(&self, notification: &mut Notification) -> Result<String>;
}

/// Action name → implementation, built once at startup.
pub type Registry = HashMap<String, Box<dyn Actor>>;

/// Every built-in action, sharing one client.
pub fn registry(client: Rc<Client>) -> Registry {
    let mut actors: Registry = HashMap::new();
    actors.insert("done".into(), Box::new(Done::new(client.clone())));
    actors.insert("read".into(), Box::new(Read::new(client.clone())));
    actors.insert("unsubscribe".into(), Box::new(Unsubscribe::new(client)));
    actors.insert("print".into(), Box::new(Print));
    actors
}
