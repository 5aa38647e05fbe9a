//! Rule filter expressions.
//!
//! A [`Filter`] is a small typed query evaluated against each notification.
//! Every criterion that is set must hold; a list-valued criterion holds when
//! any of its entries matches.  A filter with nothing set matches everything.

use serde::{Deserialize, Serialize};

use crate::notifications::{Notification, Notifications};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Filter {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ids: Vec<String>,

    /// `mention`, `review_requested`, `subscribed`, ...
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<String>,

    /// Subject type: `Issue`, `PullRequest`, `Release`, ...
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub kinds: Vec<String>,

    /// Subject state from enrichment: `open`, `closed`, `merged`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub states: Vec<String>,

    /// Subject author login from enrichment.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<String>,

    /// `owner/name`, or `owner/*` for every repository of an owner.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub repositories: Vec<String>,

    /// Case-insensitive substring of the subject title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub unread: Option<bool>,

    /// At least one of these must match.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub any: Vec<Filter>,

    /// Must not match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not: Option<Box<Filter>>,
}

fn one_of(allowed: &[String], value: &str) -> bool {
    allowed.is_empty() || allowed.iter().any(|a| a == value)
}

fn repository_matches(pattern: &str, full_name: &str) -> bool {
    match pattern.strip_suffix("/*") {
        Some(owner) => full_name
            .split_once('/')
            .is_some_and(|(o, _)| o.eq_ignore_ascii_case(owner)),
        None => pattern.eq_ignore_ascii_case(full_name),
    }
}

impl Filter {
    pub fn matches(&self, n: &Notification) -> bool {
        let state = n.subject.state.as_deref().unwrap_or_default();
        let author = n.author.as_ref().map(|a| a.login.as_str()).unwrap_or_default();

        one_of(&self.ids, &n.id)
            && one_of(&self.reasons, &n.reason)
            && one_of(&self.kinds, &n.subject.kind)
            && one_of(&self.states, state)
            && one_of(&self.authors, author)
            && (self.repositories.is_empty()
                || self
                    .repositories
                    .iter()
                    .any(|p| repository_matches(p, &n.repository.full_name)))
            && self.title.as_ref().map_or(true, |t| {
                n.subject.title.to_lowercase().contains(&t.to_lowercase())
            })
            && self.unread.map_or(true, |u| n.unread == u)
            && (self.any.is_empty() || self.any.iter().any(|f| f.matches(n)))
            && self.not.as_ref().map_or(true, |f| !f.matches(n))
    }

    /// Ids of every matching notification, in collection order.
    pub fn select(&self, notifications: &Notifications) -> Vec<String> {
        notifications
            .iter()
            .filter(|n| self.matches(n))
            .map(|n| n.id.clone())
            .collect()
    }
}
