//! HTTP transport used by the fetcher.

use std::time::Duration;

use reqwest::blocking::Client;
use tracing::debug;
use url::Url;

use crate::indicator::tools::error::Result;

/// Status and body of a completed HTTP exchange.
#[derive(Clone, Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    /// Only `200 OK` carries a payload the fetcher can parse.
    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

/// Issues a single GET request. Implementations must not retry.
pub trait HttpClient {
    fn get(&self, url: &Url) -> Result<HttpResponse>;
}

impl<T: HttpClient + ?Sized> HttpClient for &T {
    fn get(&self, url: &Url) -> Result<HttpResponse> {
        (**self).get(url)
    }
}

/// Blocking `reqwest` client with an explicit request timeout.
#[derive(Clone, Debug)]
pub struct ReqwestClient {
    inner: Client,
}

impl ReqwestClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let inner = Client::builder().timeout(timeout).build()?;
        Ok(Self { inner })
    }
}

impl HttpClient for ReqwestClient {
    fn get(&self, url: &Url) -> Result<HttpResponse> {
        debug!(%url, "sending request");
        let response = self.inner.get(url.clone()).send()?;
        let status = response.status().as_u16();
        let body = response.text()?;
        debug!(status, bytes = body.len(), "response received");
        Ok(HttpResponse { status, body })
    }
}
