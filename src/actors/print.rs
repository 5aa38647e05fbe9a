use anyhow::Result;

use super::Actor;
use crate::notifications::Notification;

/// Prints the notification and nothing else.  Useful for previewing a filter.
pub struct Print;

impl Actor for Print {
    fn run(&self, notification: &mut Notification) -> Result<String> {
        Ok(notification.to_string())
    }
}
