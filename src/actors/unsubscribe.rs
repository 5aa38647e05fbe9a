//! Stop receiving notifications for a thread.
//!
//! Ref: <https://docs.github.com/en/rest/activity/notifications#delete-a-thread-subscription>

use std::rc::Rc;

use anyhow::{bail, Context, Result};

use super::Actor;
use crate::notifications::Notification;
use crate::remote::{Client, Method};

pub struct Unsubscribe {
    client: Rc<Client>,
}

impl Unsubscribe {
    pub fn new(client: Rc<Client>) -> Self {
        Self { client }
    }
}

impl Actor for Unsubscribe {
    fn run(&self, notification: &mut Notification) -> Result<String> {
        if notification.subscription_url.is_empty() {
            bail!("{} has no subscription url", notification.id);
        }

        self.client
            .request(Method::DELETE, &notification.subscription_url)
            .with_context(|| format!("unsubscribing from {}", notification.id))?;

        Ok(format!("UNSUBSCRIBED {notification}"))
    }
}
