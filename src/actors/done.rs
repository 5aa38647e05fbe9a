//! Mark a thread as done.
//!
//! Ref: <https://docs.github.com/en/rest/activity/notifications#mark-a-thread-as-done>

use std::rc::Rc;

use anyhow::{Context, Result};
use tracing::debug;

use super::Actor;
use crate::notifications::Notification;
use crate::remote::{Client, Method};

pub struct Done {
    client: Rc<Client>,
}

impl Done {
    pub fn new(client: Rc<Client>) -> Self {
        Self { client }
    }
}

impl Actor for Done {
    fn run(&self, notification: &mut Notification) -> Result<String> {
        debug!(%notification, "marking notification as done");

        self.client
            .request(Method::DELETE, &notification.url)
            .with_context(|| format!("marking {} as done", notification.id))?;

        // Done threads disappear upstream; stop carrying them locally too.
        notification.meta.to_delete = true;

        Ok(format!("DONE {notification}"))
    }
}
