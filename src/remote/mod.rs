//! Remote access: the HTTP seam, retry policy, and the notifications client.
//!
//! Two traits separate the layers:
//!
//! * [`Caller`] issues one HTTP request and reports non-2xx statuses as
//!   errors.  [`HttpCaller`] is the reqwest implementation; tests script it.
//! * [`NotificationSource`] produces the full remote collection.  [`Client`]
//!   implements it on top of a `Caller`; the manager only sees this trait.
//!
//! ## For contributors
//!
//! Everything here is blocking.  A run issues one request at a time, so a
//! slow endpoint stalls the run until the client timeout fires.

mod client;
mod http;
mod retry;

pub use client::{Client, DEFAULT_ENDPOINT};
pub use http::HttpCaller;
pub use reqwest::Method;
pub use retry::{Retry, RetryError};

use std::rc::Rc;

use crate::error::Result;
use crate::notifications::Notifications;

/// A completed, successful HTTP exchange.
#[derive(Debug, Clone, Default)]
pub struct Response {
    pub status: u16,
    /// Raw `Link` header, if any.
    pub link: Option<String>,
    pub body: Vec<u8>,
}

impl Response {
    /// URL of the next page advertised by the `Link` header.
    pub fn next_page(&self) -> Option<String> {
        self.link.as_deref().and_then(next_page)
    }
}

/// Issues a single HTTP request.
///
/// Implementations must return [`FetchError::Status`](crate::error::FetchError::Status)
/// for non-success statuses so the retry policy can classify them.
pub trait Caller {
    fn request(&self, method: Method, url: &str) -> Result<Response>;
}

/// Anything that can produce the complete remote notification set.
pub trait NotificationSource {
    /// Human-readable label used in log lines.
    fn name(&self) -> &str;

    /// Fetch every notification.  Either the whole set or an error; never a
    /// partial result.
    fn fetch(&self) -> Result<Notifications>;
}

impl<T: NotificationSource + ?Sized> NotificationSource for Rc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch(&self) -> Result<Notifications> {
        (**self).fetch()
    }
}

/// Extract the `rel="next"` target from a `Link` header value such as
/// `<https://api.github.com/notifications?page=2>; rel="next", <...>; rel="last"`.
pub fn next_page(link: &str) -> Option<String> {
    link.split(',').find_map(|part| {
        let (target, params) = part.split_once(';')?;
        let url = target.trim().strip_prefix('<')?.strip_suffix('>')?;
        params
            .split(';')
            .any(|param| param.trim() == r#"rel="next""#)
            .then(|| url.to_string())
    })
}

// ---------------------------------------------------------------------------
// Scripted caller for tests
// ---------------------------------------------------------------------------
