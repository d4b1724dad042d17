use std::{env, future::Future, time::Duration};

use anyhow::Context;
use base64::Engine;
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use tokio_util::sync::CancellationToken;
use url::{Host, Url};

use crate::error::{from_status, from_transport, Error};

/// Upper bound for connectivity checks, including establishing the connection.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(10);
/// Upper bound for any request that fetches data, including reading the body.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

const DEFAULT_PORT: u16 = 8000;

pub fn authorization_headers(username: &str, password: &str) -> HeaderMap {
    let credentials = format!("{username}:{password}");
    let auth_header = format!(
        "Basic {}",
        base64::engine::general_purpose::STANDARD.encode(credentials)
    );
    let mut value =
        HeaderValue::try_from(auth_header).expect("Base64 is always a valid header value");
    value.set_sensitive(true);
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, value);
    headers
}

pub struct ClientBuilder {
    host: Host,
    port: Option<u16>,
    scheme: Scheme,
    fetch_timeout: Duration,
    inner: reqwest::ClientBuilder,
}

impl ClientBuilder {
    pub fn new(host: Host) -> Self {
        Self {
            host,
            port: None,
            scheme: Scheme::Plain,
            fetch_timeout: FETCH_TIMEOUT,
            inner: reqwest::Client::builder().connect_timeout(PROBE_TIMEOUT),
        }
    }

    pub fn from_env() -> anyhow::Result<Self> {
        let username = env::var("AXXON_USER")?;
        let password = env::var("AXXON_PASS")?;
        let host = env::var("AXXON_HOST")?;
        let port = env::var("AXXON_PORT")
            .ok()
            .map(|p| p.parse())
            .transpose()?;
        let scheme = match env::var("AXXON_HTTPS").as_deref() {
            Ok("1") | Ok("true") => Scheme::Secure,
            _ => Scheme::Plain,
        };
        let host = Host::parse(&host)?;

        debug!("Building client using username {username} from env");
        Ok(ClientBuilder::new(host)
            .port(port)
            .scheme(scheme)
            .basic_authentication(&username, &password))
    }

    pub fn basic_authentication(mut self, username: &str, password: &str) -> Self {
        let headers = authorization_headers(username, password);
        self.inner = self.inner.default_headers(headers);
        self
    }

    /// Port to connect to; defaults to the port the VMS web server listens on out of the box.
    pub fn port(mut self, port: Option<u16>) -> Self {
        self.port = port;
        self
    }

    pub fn scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Upper bound for requests that fetch data; defaults to [`FETCH_TIMEOUT`].
    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn with_inner(
        mut self,
        f: impl FnOnce(reqwest::ClientBuilder) -> reqwest::ClientBuilder,
    ) -> Self {
        self.inner = f(self.inner);
        self
    }

    pub fn build(self) -> anyhow::Result<Client> {
        let Self {
            host,
            port,
            scheme,
            fetch_timeout,
            inner,
        } = self;
        let client = inner.build().context("Could not build HTTP client")?;
        Ok(Client {
            scheme,
            host,
            port: port.unwrap_or(DEFAULT_PORT),
            fetch_timeout,
            client,
            closed: CancellationToken::new(),
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scheme {
    /// HTTPS
    Secure,
    /// HTTP
    Plain,
}

impl Scheme {
    const fn http(self) -> &'static str {
        match self {
            Scheme::Secure => "https",
            Scheme::Plain => "http",
        }
    }
}

/// A session with one VMS server.
///
/// Connections are pooled and reused by every request made through the same client. Use one
/// client per caller; requests made through one client are expected to be awaited one at a time.
///
/// Clones share the session: closing any of them fails every request that is in flight or made
/// later through any clone with [`Error::SessionClosed`].
#[derive(Clone)]
pub struct Client {
    scheme: Scheme,
    host: Host,
    port: u16,
    fetch_timeout: Duration,
    client: reqwest::Client,
    closed: CancellationToken,
}

impl Client {
    pub fn builder(host: Host) -> ClientBuilder {
        ClientBuilder::new(host)
    }

    /// Create a session that authenticates every request with the given credentials.
    ///
    /// No request is made; use [`Client::probe`] to verify that the server can be reached.
    pub fn connect(
        host: &str,
        port: u16,
        username: &str,
        password: &str,
        use_https: bool,
    ) -> anyhow::Result<Self> {
        let host = Host::parse(host)
            .map_err(|e| Error::InvalidInput(format!("host {host:?}: {e}")))?;
        let scheme = match use_https {
            true => Scheme::Secure,
            false => Scheme::Plain,
        };
        ClientBuilder::new(host)
            .port(Some(port))
            .scheme(scheme)
            .basic_authentication(username, password)
            .build()
    }

    /// Check that the server is reachable and accepts the credentials.
    pub async fn probe(&self) -> anyhow::Result<()> {
        self.until_closed(send(self.get("camera/list")?.timeout(PROBE_TIMEOUT)))
            .await
            .with_context(|| format!("Could not connect to {}", self.url()))?;
        Ok(())
    }

    /// End the session, aborting any request still in flight on this client or its clones.
    pub fn close(self) {
        debug!("Closing session with {}", self.url());
        self.closed.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Drive `operation` to completion unless the session is closed first.
    pub(crate) async fn until_closed<T>(
        &self,
        operation: impl Future<Output = anyhow::Result<T>>,
    ) -> anyhow::Result<T> {
        if self.is_closed() {
            return Err(Error::SessionClosed.into());
        }
        match self.closed.run_until_cancelled(operation).await {
            Some(result) => result,
            None => Err(Error::SessionClosed.into()),
        }
    }

    pub(crate) fn fetch_timeout(&self) -> Duration {
        self.fetch_timeout
    }

    pub(crate) fn get(&self, path: &str) -> anyhow::Result<reqwest::RequestBuilder> {
        Ok(self.client.get(self.url().join(path)?))
    }

    /// Like [`Client::get`], but `url` may also be absolute, possibly pointing at another host.
    pub(crate) fn get_url(&self, url: &str) -> anyhow::Result<reqwest::RequestBuilder> {
        let url = self
            .url()
            .join(url)
            .map_err(|e| Error::MalformedResponse(format!("invalid URL {url:?}: {e}")))?;
        Ok(self.client.get(url))
    }

    pub fn url(&self) -> Url {
        let Self {
            scheme, host, port, ..
        } = self;
        let scheme = scheme.http();
        Url::parse(&format!("{scheme}://{host}:{port}"))
            .expect("Restricted types are known to combine into a valid URL")
    }
}

/// Send the request and turn any non-success status into an error.
pub(crate) async fn send(request: reqwest::RequestBuilder) -> anyhow::Result<reqwest::Response> {
    let response = request.send().await.map_err(from_transport)?;
    let status = response.status();
    if !status.is_success() {
        return Err(from_status(status).into());
    }
    Ok(response)
}
