//! The core record shared across fetching, caching, and rule application.
//!
//! `Notification` mirrors one element of the GitHub notifications API.  The
//! remote-origin fields are carried through unmodified; only [`Meta`] is owned
//! locally and survives a refresh.
//!
//! ## For contributors
//!
//! If the API grows a field you want to filter on, add it here with
//! `#[serde(default)]` so older cache files still decode.  Fields the crate does
//! not model are preserved in `extra` and written back to the cache verbatim.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single notification thread, as returned by the API plus local state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Thread id assigned by the remote.  Primary key for every merge,
    /// de-duplication, and lookup.
    pub id: String,

    #[serde(default)]
    pub unread: bool,

    /// Why the user is receiving this (`mention`, `review_requested`, ...).
    #[serde(default)]
    pub reason: String,

    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub last_read_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub subject: Subject,

    #[serde(default)]
    pub repository: Repository,

    /// API URL of the thread itself; target of the mark-read / mark-done calls.
    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub subscription_url: String,

    /// Author of the subject, filled in by enrichment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<User>,

    /// Locally-owned processing state.  Never sent by the remote.
    #[serde(default)]
    pub meta: Meta,

    /// Remote fields this crate does not model, kept for round-tripping.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// What the notification is about.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    #[serde(default)]
    pub title: String,

    /// API URL of the issue / pull request / release.  `None` for discussions
    /// and a few other subject types.
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub latest_comment_url: Option<String>,

    /// `Issue`, `PullRequest`, `Release`, `Discussion`, ...
    #[serde(rename = "type", default)]
    pub kind: String,

    /// `open`, `closed` or `merged`, filled in by enrichment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    /// Browser URL of the subject, filled in by enrichment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    #[serde(default)]
    pub name: String,

    /// `owner/name`.
    #[serde(default)]
    pub full_name: String,

    #[serde(default)]
    pub private: bool,

    #[serde(default)]
    pub fork: bool,

    #[serde(default)]
    pub html_url: String,

    #[serde(default)]
    pub owner: User,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub login: String,
}

/// Processing state recorded by this tool, not by GitHub.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    /// An action has processed this notification; rules skip it from now on.
    #[serde(default)]
    pub done: bool,

    /// Drop this notification from the persisted collection on the next
    /// compaction.
    #[serde(default)]
    pub to_delete: bool,
}

impl Meta {
    /// Fold another observation of the same thread into this one.
    ///
    /// Flags only ever turn on: a `true` seen anywhere stays `true`.
    pub fn absorb(&mut self, other: Meta) {
        self.done |= other.done;
        self.to_delete |= other.to_delete;
    }
}

impl Notification {
    #[cfg(test)]
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.id, self.subject.kind, self.repository.full_name, self.subject.title
        )?;
        if let Some(state) = &self.subject.state {
            write!(f, " ({state})")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const API_ITEM: &str = r#"{
        "id": "1",
        "unread": true,
        "reason": "review_requested",
        "updated_at": "2024-03-01T10:00:00Z",
        "last_read_at": null,
        "subject": {
            "title": "Fix the flaky test",
            "url": "https://api.github.com/repos/octo/hello/pulls/7",
            "latest_comment_url": null,
            "type": "PullRequest"
        },
        "repository": {
            "name": "hello",
            "full_name": "octo/hello",
            "private": false,
            "fork": false,
            "html_url": "https://github.com/octo/hello",
            "owner": { "login": "octo" }
        },
        "url": "https://api.github.com/notifications/threads/1",
        "subscription_url": "https://api.github.com/notifications/threads/1/subscription"
    }"#;

    #[test]
    fn decodes_api_item_with_default_meta() {
        let n: Notification = serde_json::from_str(API_ITEM).unwrap();

        assert_eq!(n.id, "1");
        assert!(n.unread);
        assert_eq!(n.reason, "review_requested");
        assert_eq!(n.subject.kind, "PullRequest");
        assert_eq!(n.repository.full_name, "octo/hello");
        assert_eq!(n.repository.owner.login, "octo");
        assert_eq!(n.meta, Meta::default());
        assert!(n.author.is_none());
    }

    #[test]
    fn unknown_fields_survive_a_round_trip() {
        let raw = r#"{"id": "9", "subject": {"title": "t", "type": "Issue"}, "note": {"x": 1}}"#;
        let n: Notification = serde_json::from_str(raw).unwrap();
        assert_eq!(n.extra.get("note"), Some(&serde_json::json!({"x": 1})));

        let encoded = serde_json::to_value(&n).unwrap();
        assert_eq!(encoded["note"], serde_json::json!({"x": 1}));
    }

    #[test]
    fn meta_is_persisted() {
        let mut n = Notification::with_id("3");
        n.meta.done = true;

        let encoded = serde_json::to_string(&n).unwrap();
        let decoded: Notification = serde_json::from_str(&encoded).unwrap();

        assert!(decoded.meta.done);
        assert!(!decoded.meta.to_delete);
    }

    #[test]
    fn absorb_never_clears_a_flag() {
        let mut meta = Meta {
            done: true,
            to_delete: false,
        };
        meta.absorb(Meta {
            done: false,
            to_delete: true,
        });

        assert!(meta.done);
        assert!(meta.to_delete);
    }

    #[test]
    fn display_includes_state_when_known() {
        let mut n: Notification = serde_json::from_str(API_ITEM).unwrap();
        assert_eq!(n.to_string(), "1 PullRequest octo/hello Fix the flaky test");

        n.subject.state = Some("merged".into());
        assert_eq!(
            n.to_string(),
            "1 PullRequest octo/hello Fix the flaky test (merged)"
        );
    }
}
