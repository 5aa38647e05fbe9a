//! Mark a thread as read.
//!
//! Ref: <https://docs.github.com/en/rest/activity/notifications#mark-a-thread-as-read>

use std::rc::Rc;

use anyhow::{Context, Result};
use tracing::debug;

use super::Actor;
use crate::notifications::Notification;
use crate::remote::{Client, Method};

pub struct Read {
    client: Rc<Client>,
}

impl Read {
    pub fn new(client: Rc<Client>) -> Self {
        Self { client }
    }
}

impl Actor for Read {
    fn run(&self, notification: &mut Notification) -> Result<String> {
        debug!(%notification, "marking notification as read");

        self.client
            .request(Method::PATCH, &notification.url)
            .with_context(|| format!("marking {} as read", notification.id))?;

        notification.unread = false;

        Ok(format!("READ {notification}"))
    }
}
