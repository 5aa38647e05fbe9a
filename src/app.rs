use ratatui::widgets::ListState;

use crate::actors::Registry;
use crate::notifications::Notifications;
use crate::rules::run_action;

/// State of the interactive list view.
pub struct App {
    /// The manager's working collection, borrowed for the session.
    pub items: Notifications,
    /// List selection state for scrolling.
    pub list_state: ListState,
    /// Whether the user has requested to quit.
    pub quit: bool,
    /// Outcome of the last action.
    pub status: String,
    /// Action requested by the last key press, run by the main loop.
    pending: Option<&'static str>,
}

impl App {
    pub fn new(items: Notifications) -> Self {
        let mut list_state = ListState::default();
        if !items.is_empty() {
            list_state.select(Some(0));
        }
        Self {
            items,
            list_state,
            quit: false,
            status: "Ready".into(),
            pending: None,
        }
    }

    pub fn into_notifications(self) -> Notifications {
        self.items
    }

    // -- actions -------------------------------------------------------------

    pub fn request(&mut self, action: &'static str) {
        self.pending = Some(action);
    }

    pub fn take_request(&mut self) -> Option<&'static str> {
        self.pending.take()
    }

    /// Run `action` on the selected notification and report in the status bar.
    pub fn run_on_selected(&mut self, action: &str, actors: &Registry) {
        let Some(actor) = actors.get(action) else {
            self.status = format!("Unknown action {action}");
            return;
        };
        let Some(notification) = self
            .list_state
            .selected()
            .and_then(|i| self.items.get_mut(i))
        else {
            return;
        };

        if notification.meta.done {
            self.status = format!("{} is already done", notification.id);
            return;
        }

        self.status = match run_action(actor.as_ref(), notification) {
            Ok(line) => line,
            Err(e) => format!("Error: {e:#}"),
        };
    }

    // -- navigation ----------------------------------------------------------

    pub fn select_next(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => (i + 1).min(self.items.len() - 1),
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn select_previous(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => i.saturating_sub(1),
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn select_first(&mut self) {
        if !self.items.is_empty() {
            self.list_state.select(Some(0));
        }
    }

    pub fn select_last(&mut self) {
        if !self.items.is_empty() {
            self.list_state.select(Some(self.items.len() - 1));
        }
    }
}
