use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use thiserror::Error;
use url::Url;

use crate::multistatus::{MultiStatus, parse_lock_token, parse_multistatus};

/// Idle pooled connections kept per host; concurrent requests are not capped.
const MAX_IDLE_PER_HOST: usize = 20;

const PROPFIND_ALLPROP: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<D:propfind xmlns:D="DAV:"><D:allprop/></D:propfind>"#;

#[derive(Debug, Error)]
pub enum WebDavError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("malformed xml: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("invalid http method: {0}")]
    InvalidMethod(&'static str),
    #[error("expected multi-status response, server returned {status}")]
    NotMultiStatus { status: StatusCode },
    #[error("response body is not a multistatus document")]
    MissingMultiStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Depth {
    Zero,
    One,
}

impl Depth {
    fn header_value(self) -> &'static str {
        match self {
            Depth::Zero => "0",
            Depth::One => "1",
        }
    }
}

#[derive(Debug)]
pub struct GetResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl GetResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }
}

#[derive(Debug)]
pub struct PropfindResponse {
    pub status: StatusCode,
    pub body: String,
}

impl PropfindResponse {
    /// Fails unless the server answered `207 Multi-Status` with a parseable body.
    pub fn multi_status(&self) -> Result<MultiStatus, WebDavError> {
        if self.status != StatusCode::MULTI_STATUS {
            return Err(WebDavError::NotMultiStatus {
                status: self.status,
            });
        }
        parse_multistatus(&self.body)
    }
}

#[derive(Debug)]
pub struct LockResponse {
    pub status: StatusCode,
    pub token: Option<String>,
}

#[derive(Clone)]
pub struct WebDavClient {
    http: Client,
    credentials: Option<Credentials>,
}

impl WebDavClient {
    pub fn anonymous() -> Result<Self, WebDavError> {
        Self::build(None)
    }

    pub fn with_credentials(credentials: Credentials) -> Result<Self, WebDavError> {
        Self::build(Some(credentials))
    }

    fn build(credentials: Option<Credentials>) -> Result<Self, WebDavError> {
        let http = Client::builder()
            .pool_max_idle_per_host(MAX_IDLE_PER_HOST)
            .build()?;
        Ok(Self { http, credentials })
    }

    pub async fn mkcol(&self, url: &str) -> Result<StatusCode, WebDavError> {
        let response = self.request(dav_method("MKCOL")?, url)?.send().await?;
        Ok(response.status())
    }

    pub async fn put(&self, url: &str, body: Vec<u8>) -> Result<StatusCode, WebDavError> {
        let response = self.request(Method::PUT, url)?.body(body).send().await?;
        Ok(response.status())
    }

    /// PUT conditioned on a held lock through the `If` header.
    pub async fn put_locked(
        &self,
        url: &str,
        body: Vec<u8>,
        lock_token: &str,
    ) -> Result<StatusCode, WebDavError> {
        let response = self
            .request(Method::PUT, url)?
            .header("If", format!("(<{lock_token}>)"))
            .body(body)
            .send()
            .await?;
        Ok(response.status())
    }

    pub async fn get(&self, url: &str) -> Result<GetResponse, WebDavError> {
        let response = self.request(Method::GET, url)?.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();
        Ok(GetResponse {
            status,
            headers,
            body,
        })
    }

    pub async fn get_status(&self, url: &str) -> Result<StatusCode, WebDavError> {
        let response = self.request(Method::GET, url)?.send().await?;
        Ok(response.status())
    }

    pub async fn delete(&self, url: &str) -> Result<StatusCode, WebDavError> {
        let response = self.request(Method::DELETE, url)?.send().await?;
        Ok(response.status())
    }

    pub async fn move_resource(
        &self,
        from: &str,
        to: &str,
        overwrite: bool,
    ) -> Result<StatusCode, WebDavError> {
        self.transfer("MOVE", from, to, overwrite).await
    }

    pub async fn copy_resource(
        &self,
        from: &str,
        to: &str,
        overwrite: bool,
    ) -> Result<StatusCode, WebDavError> {
        self.transfer("COPY", from, to, overwrite).await
    }

    pub async fn propfind(&self, url: &str, depth: Depth) -> Result<PropfindResponse, WebDavError> {
        let response = self
            .request(dav_method("PROPFIND")?, url)?
            .header("Depth", depth.header_value())
            .header("Content-Type", "application/xml; charset=utf-8")
            .body(PROPFIND_ALLPROP)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        Ok(PropfindResponse { status, body })
    }

    /// Exclusive write lock owned by `owner`.
    pub async fn lock(
        &self,
        url: &str,
        owner: &str,
        timeout: Duration,
    ) -> Result<LockResponse, WebDavError> {
        let response = self
            .request(dav_method("LOCK")?, url)?
            .header("Depth", "infinity")
            .header("Timeout", format!("Second-{}", timeout.as_secs()))
            .header("Content-Type", "application/xml; charset=utf-8")
            .body(lock_body(owner))
            .send()
            .await?;
        let status = response.status();
        let header_token = response
            .headers()
            .get("Lock-Token")
            .and_then(|value| value.to_str().ok())
            .map(strip_coded_url);
        let body = response.text().await?;
        let token = header_token.or_else(|| parse_lock_token(&body));
        Ok(LockResponse { status, token })
    }

    pub async fn unlock(&self, url: &str, lock_token: &str) -> Result<StatusCode, WebDavError> {
        let response = self
            .request(dav_method("UNLOCK")?, url)?
            .header("Lock-Token", format!("<{lock_token}>"))
            .send()
            .await?;
        Ok(response.status())
    }

    async fn transfer(
        &self,
        verb: &'static str,
        from: &str,
        to: &str,
        overwrite: bool,
    ) -> Result<StatusCode, WebDavError> {
        let destination = Url::parse(to)?;
        let response = self
            .request(dav_method(verb)?, from)?
            .header("Destination", destination.as_str())
            .header("Overwrite", if overwrite { "T" } else { "F" })
            .send()
            .await?;
        Ok(response.status())
    }

    fn request(&self, method: Method, url: &str) -> Result<RequestBuilder, WebDavError> {
        let url = Url::parse(url)?;
        let builder = self.http.request(method, url);
        Ok(match &self.credentials {
            Some(credentials) => {
                builder.basic_auth(&credentials.username, Some(&credentials.password))
            }
            None => builder,
        })
    }
}

fn dav_method(name: &'static str) -> Result<Method, WebDavError> {
    Method::from_bytes(name.as_bytes()).map_err(|_| WebDavError::InvalidMethod(name))
}

fn lock_body(owner: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<D:lockinfo xmlns:D="DAV:"><D:lockscope><D:exclusive/></D:lockscope><D:locktype><D:write/></D:locktype><D:owner>{}</D:owner></D:lockinfo>"#,
        quick_xml::escape::escape(owner)
    )
}

fn strip_coded_url(value: &str) -> String {
    value
        .trim()
        .trim_start_matches('<')
        .trim_end_matches('>')
        .to_string()
}
