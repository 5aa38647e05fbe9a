//! reqwest implementation of [`Caller`].

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{self, HeaderMap, HeaderValue};
use tracing::warn;

use super::{Caller, Method, Response};
use crate::error::{FetchError, Result};

const API_VERSION: &str = "2022-11-28";

/// Blocking HTTP client carrying the GitHub auth and media-type headers.
#[derive(Clone)]
pub struct HttpCaller {
    client: Client,
}

impl HttpCaller {
    pub fn new(token: &str, timeout: Duration) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "x-github-api-version",
            HeaderValue::from_static(API_VERSION),
        );
        let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))?;
        auth.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, auth);

        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self { client })
    }
}

impl Caller for HttpCaller {
    fn request(&self, method: Method, url: &str) -> Result<Response> {
        let transport = |source: reqwest::Error| FetchError::Transport {
            method: method.to_string(),
            url: url.to_string(),
            source: source.into(),
        };

        let response = self
            .client
            .request(method.clone(), url)
            .send()
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                method: method.to_string(),
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let link = match response.headers().get(header::LINK).map(|value| value.to_str()) {
            Some(Ok(value)) => Some(value.to_string()),
            Some(Err(e)) => {
                warn!(%url, error = %e, "ignoring non-ASCII Link header, pagination stops here");
                None
            }
            None => None,
        };
        let body = response.bytes().map_err(transport)?.to_vec();

        Ok(Response {
            status: status.as_u16(),
            link,
            body,
        })
    }
}
