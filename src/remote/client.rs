//! Paginated, retrying notifications client.

use std::collections::HashSet;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::{Caller, Method, NotificationSource, Response, Retry, RetryError};
use crate::error::{FetchError, Result};
use crate::notifications::{Notification, Notifications, User};

pub const DEFAULT_ENDPOINT: &str = "https://api.github.com/notifications";

/// Walks the notifications endpoint and enriches each thread with details
/// about its subject.  Also the shared request path for actors, so their
/// calls get the same retry policy.
pub struct Client {
    caller: Box<dyn Caller>,
    endpoint: String,
    retry: Retry,
}

/// The bits of an issue / pull request / release payload we keep.
#[derive(Debug, Default, Deserialize)]
struct SubjectDetail {
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    merged: bool,
    /// Issues and pull requests.
    #[serde(default)]
    user: Option<User>,
    /// Releases.
    #[serde(default)]
    author: Option<User>,
    #[serde(default)]
    html_url: Option<String>,
}

impl Client {
    pub fn new(caller: Box<dyn Caller>, endpoint: impl Into<String>) -> Self {
        Self {
            caller,
            endpoint: endpoint.into(),
            retry: Retry::default(),
        }
    }

    pub fn with_retry(mut self, retry: Retry) -> Self {
        self.retry = retry;
        self
    }

    /// Issue one request, retrying gateway errors.  Each call gets a fresh
    /// attempt budget.
    pub fn request(&self, method: Method, url: &str) -> Result<Response> {
        self.retry
            .run(
                url,
                |_| self.caller.request(method.clone(), url),
                FetchError::is_transient,
            )
            .map_err(|e| match e {
                RetryError::Exhausted { attempts, last } => {
                    warn!(%url, attempts, error = %last, "giving up");
                    FetchError::RetryExceeded {
                        url: url.to_string(),
                        attempts,
                    }
                }
                RetryError::Fatal(e) => e,
            })
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<(T, Response)> {
        let response = self.request(Method::GET, url)?;
        let value = serde_json::from_slice(&response.body).map_err(|source| FetchError::Decode {
            url: url.to_string(),
            source,
        })?;
        Ok((value, response))
    }

    /// Every page of the endpoint, concatenated in arrival order.
    fn paginate(&self) -> Result<Notifications> {
        let mut list = Notifications::new();
        let mut visited = HashSet::new();
        let mut next = Some(self.endpoint.clone());

        while let Some(endpoint) = next {
            if !visited.insert(endpoint.clone()) {
                return Err(FetchError::PageLoop { url: endpoint });
            }
            info!(%endpoint, "API REST request");
            let (page, response): (Notifications, _) = self.get_json(&endpoint)?;
            debug!(%endpoint, status = response.status, count = page.len(), "page received");
            list.extend(page);
            next = response.next_page();
        }

        Ok(list)
    }

    /// Fill in subject state, author, and browser URL.  Subjects without an
    /// API URL (discussions, for instance) are left as they are.
    fn enrich(&self, notification: &mut Notification) -> Result<()> {
        let Some(url) = notification.subject.url.clone() else {
            return Ok(());
        };

        let (detail, _): (SubjectDetail, _) = self.get_json(&url)?;

        notification.subject.state = if detail.merged {
            Some("merged".to_string())
        } else {
            detail.state
        };
        notification.subject.html_url = detail.html_url;
        notification.author = detail.user.or(detail.author);
        Ok(())
    }
}

impl NotificationSource for Client {
    fn name(&self) -> &str {
        &self.endpoint
    }

    fn fetch(&self) -> Result<Notifications> {
        let mut list = self.paginate()?;
        for notification in list.iter_mut() {
            self.enrich(notification)?;
        }
        Ok(list)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::remote::testing::{Reply, ScriptedCaller};

    const ENDPOINT: &str = "https://api.test/notifications";

    /// Lets the test keep a handle on the caller after handing it to a client.
    struct Shared(Rc<ScriptedCaller>);

    impl Caller for Shared {
        fn request(&self, method: Method, url: &str) -> Result<Response> {
            self.0.request(method, url)
        }
    }

    fn client(replies: Vec<Reply>) -> (Client, Rc<ScriptedCaller>) {
        let caller = Rc::new(ScriptedCaller::new(replies));
        let client = Client::new(Box::new(Shared(caller.clone())), ENDPOINT)
            .with_retry(Retry::immediate(5));
        (client, caller)
    }

    fn page(ids: &[&str]) -> String {
        let items: Vec<String> = ids
            .iter()
            .map(|id| format!(r#"{{"id": "{id}", "subject": {{"title": "t{id}", "type": "Issue"}}}}"#))
            .collect();
        format!("[{}]", items.join(","))
    }

    #[test]
    fn follows_next_links_until_exhausted() {
        let (client, caller) = client(vec![
            Reply::page(page(&["1", "2"]), "https://api.test/notifications?page=2"),
            Reply::page(page(&["3"]), "https://api.test/notifications?page=3"),
            Reply::json(page(&["4", "5"])),
        ]);

        let got = client.fetch().unwrap();

        assert_eq!(got.id_list(), vec!["1", "2", "3", "4", "5"]);
        assert_eq!(
            caller.urls(),
            vec![
                ENDPOINT.to_string(),
                "https://api.test/notifications?page=2".to_string(),
                "https://api.test/notifications?page=3".to_string(),
            ]
        );
    }

    #[test]
    fn next_link_back_to_a_fetched_page_fails() {
        let (client, caller) = client(vec![
            Reply::page(page(&["1"]), "https://api.test/notifications?page=2"),
            Reply::page(page(&["2"]), ENDPOINT),
        ]);

        let err = client.fetch().unwrap_err();

        assert!(
            matches!(&err, FetchError::PageLoop { url } if url == ENDPOINT),
            "got {err:?}"
        );
        assert_eq!(caller.request_count(), 2);
    }

    #[test]
    fn empty_inbox_is_one_request() {
        let (client, caller) = client(vec![Reply::json("[]")]);

        assert!(client.fetch().unwrap().is_empty());
        assert_eq!(caller.request_count(), 1);
    }

    #[test]
    fn null_entries_in_a_page_are_dropped() {
        let (client, _) = client(vec![Reply::json(r#"[null, {"id": "1"}, null]"#)]);
        assert_eq!(client.fetch().unwrap().id_list(), vec!["1"]);
    }

    #[test]
    fn gateway_timeouts_exhaust_after_five_attempts() {
        let (client, caller) = client((0..5).map(|_| Reply::Status(504)).collect());

        let err = client.fetch().unwrap_err();

        assert!(
            matches!(&err, FetchError::RetryExceeded { url, attempts: 5 } if url == ENDPOINT),
            "got {err:?}"
        );
        assert_eq!(caller.request_count(), 5);
    }

    #[test]
    fn not_found_is_not_retried() {
        let (client, caller) = client(vec![Reply::Status(404)]);

        let err = client.fetch().unwrap_err();

        assert!(matches!(err, FetchError::Status { status: 404, .. }));
        assert_eq!(caller.request_count(), 1);
    }

    #[test]
    fn transient_failure_then_success_recovers() {
        let (client, caller) = client(vec![
            Reply::Status(502),
            Reply::Status(504),
            Reply::json(page(&["1"])),
        ]);

        assert_eq!(client.fetch().unwrap().id_list(), vec!["1"]);
        assert_eq!(caller.request_count(), 3);
    }

    #[test]
    fn each_page_gets_its_own_retry_budget() {
        let mut replies: Vec<Reply> = (0..4).map(|_| Reply::Status(502)).collect();
        replies.push(Reply::page(page(&["1"]), "https://api.test/notifications?page=2"));
        replies.extend((0..4).map(|_| Reply::Status(504)));
        replies.push(Reply::json(page(&["2"])));
        let (client, caller) = client(replies);

        assert_eq!(client.fetch().unwrap().id_list(), vec!["1", "2"]);
        assert_eq!(caller.request_count(), 10);
    }

    #[test]
    fn undecodable_page_fails() {
        let (client, _) = client(vec![Reply::json("{\"message\": \"nope\"}")]);
        assert!(matches!(client.fetch(), Err(FetchError::Decode { .. })));
    }

    #[test]
    fn enrichment_records_subject_details() {
        let listing = r#"[
            {"id": "1", "subject": {"title": "PR", "type": "PullRequest", "url": "https://api.test/repos/o/r/pulls/1"}},
            {"id": "2", "subject": {"title": "Issue", "type": "Issue", "url": "https://api.test/repos/o/r/issues/2"}},
            {"id": "3", "subject": {"title": "Talk", "type": "Discussion", "url": null}}
        ]"#;
        let (client, caller) = client(vec![
            Reply::json(listing),
            Reply::json(
                r#"{"state": "closed", "merged": true, "user": {"login": "alice"}, "html_url": "https://github.com/o/r/pull/1"}"#,
            ),
            Reply::json(r#"{"state": "open", "user": {"login": "bob"}}"#),
        ]);

        let got = client.fetch().unwrap();

        assert_eq!(got[0].subject.state.as_deref(), Some("merged"));
        assert_eq!(got[0].author.as_ref().unwrap().login, "alice");
        assert_eq!(
            got[0].subject.html_url.as_deref(),
            Some("https://github.com/o/r/pull/1")
        );
        assert_eq!(got[1].subject.state.as_deref(), Some("open"));
        assert_eq!(got[1].author.as_ref().unwrap().login, "bob");
        assert!(got[2].subject.state.is_none());
        assert_eq!(caller.request_count(), 3, "discussion is not enriched");
    }

    #[test]
    fn enrichment_failure_aborts_fetch() {
        let listing = r#"[
            {"id": "1", "subject": {"type": "Issue", "url": "https://api.test/repos/o/r/issues/1"}}
        ]"#;
        let (client, _) = client(vec![Reply::json(listing), Reply::Status(403)]);

        assert!(matches!(
            client.fetch(),
            Err(FetchError::Status { status: 403, .. })
        ));
    }

    #[test]
    fn request_retries_for_actor_calls() {
        let (client, caller) = client(vec![Reply::Status(502), Reply::json("")]);

        let response = client
            .request(Method::DELETE, "https://api.test/notifications/threads/1")
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(caller.request_count(), 2);
        assert_eq!(caller.requests.borrow()[1].0, Method::DELETE);
    }
}
