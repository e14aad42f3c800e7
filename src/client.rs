//! HTTP Client with builder pattern.
//!
//! A client is either *intercepting* (built with an
//! [`InterceptionContext`]) or plain. An intercepting client resolves
//! protected hosts over DoH and connects to them without SNI; a plain
//! client never special-cases any host.
//!
//! # Example
//!
//! ```rust,ignore
//! use sniveil::{Client, DohConfig, InterceptionContext};
//!
//! let ctx = InterceptionContext::new(DohConfig::default())?;
//! ctx.add_hosts(["www.pixiv.net"]);
//!
//! let client = Client::builder().interception(ctx).build()?;
//! let resp = client.get("https://www.pixiv.net/").send().await?;
//! ```

use crate::base::context::TimeoutResultExt;
use crate::base::neterror::NetError;
use crate::dns::{GaiResolver, Resolve};
use crate::http::streamfactory::{build_request, HttpStreamFactory};
use crate::http::HttpResponse;
use crate::interception::InterceptionContext;
use crate::socket::connectjob::ConnectJob;
use crate::socket::tls::{TlsConnector, TlsOptions};
use http::Method;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// HTTP client.
///
/// Use [`Client::builder()`] to configure and create a client. Cloning is
/// cheap; clones share connection settings and interception state.
#[derive(Clone, Debug)]
pub struct Client {
    factory: HttpStreamFactory,
    interception: Option<InterceptionContext>,
    timeout: Option<Duration>,
}

impl Client {
    /// A plain client with default settings.
    pub fn new() -> Result<Self, NetError> {
        Self::builder().build()
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// The interception context, if this client intercepts.
    pub fn interception(&self) -> Option<&InterceptionContext> {
        self.interception.as_ref()
    }

    pub fn is_intercepting(&self) -> bool {
        self.interception.is_some()
    }

    pub fn get<U: AsRef<str>>(&self, url: U) -> RequestBuilder {
        self.request(Method::GET, url)
    }

    pub fn head<U: AsRef<str>>(&self, url: U) -> RequestBuilder {
        self.request(Method::HEAD, url)
    }

    /// Start building a request with custom method.
    pub fn request<U: AsRef<str>>(&self, method: Method, url: U) -> RequestBuilder {
        RequestBuilder {
            client: self.clone(),
            method,
            url: url.as_ref().to_string(),
            headers: http::HeaderMap::new(),
        }
    }
}

/// Builder for creating a [`Client`].
#[derive(Default)]
pub struct ClientBuilder {
    interception: Option<InterceptionContext>,
    native_resolver: Option<Arc<dyn Resolve>>,
    tls_options: Option<TlsOptions>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
}

impl ClientBuilder {
    /// Intercept DNS and SNI for the hosts registered in `ctx`.
    pub fn interception(mut self, ctx: InterceptionContext) -> Self {
        self.interception = Some(ctx);
        self
    }

    /// Build a plain client even if an interception context was set.
    pub fn without_interception(mut self) -> Self {
        self.interception = None;
        self
    }

    /// Resolver for hosts that are not protected. Defaults to
    /// [`GaiResolver`].
    pub fn native_resolver(mut self, resolver: Arc<dyn Resolve>) -> Self {
        self.native_resolver = Some(resolver);
        self
    }

    pub fn tls_options(mut self, opts: TlsOptions) -> Self {
        self.tls_options = Some(opts);
        self
    }

    /// Bound each request from connect to response headers.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Bound each TCP connect attempt.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<Client, NetError> {
        let native = self
            .native_resolver
            .unwrap_or_else(|| Arc::new(GaiResolver::new()));
        let tls_options = self.tls_options.unwrap_or_default();

        let (resolver, sni) = match &self.interception {
            Some(ctx) => {
                tracing::debug!(hosts = ctx.hosts().len(), "building intercepting client");
                let dispatcher: Arc<dyn Resolve> = Arc::new(ctx.dispatcher(native));
                (dispatcher, Some(ctx.sni_suppressor()))
            }
            None => (native, None),
        };

        let tls = TlsConnector::new(&tls_options, sni)?;
        let job =
            ConnectJob::new(resolver, Arc::new(tls)).with_connect_timeout(self.connect_timeout);

        Ok(Client {
            factory: HttpStreamFactory::new(Arc::new(job)),
            interception: self.interception,
            timeout: self.timeout,
        })
    }
}

/// Builder for a single request.
pub struct RequestBuilder {
    client: Client,
    method: Method,
    url: String,
    headers: http::HeaderMap,
}

impl RequestBuilder {
    /// Add a header. Invalid names or values are ignored.
    pub fn header<K, V>(mut self, key: K, value: V) -> Self
    where
        K: http::header::IntoHeaderName,
        V: TryInto<http::HeaderValue>,
    {
        if let Ok(val) = value.try_into() {
            self.headers.insert(key, val);
        }
        self
    }

    /// Send the request.
    pub async fn send(self) -> Result<HttpResponse, NetError> {
        let url = Url::parse(&self.url).map_err(|_| NetError::InvalidUrl)?;
        let req = build_request(self.method, &url, self.headers)?;
        let factory = self.client.factory.clone();

        let exchange = async move {
            let mut stream = factory.request_stream(&url).await?;
            stream.send_request(req).await
        };

        match self.client.timeout {
            Some(limit) => tokio::time::timeout(limit, exchange).await.connect_timeout(),
            None => exchange.await,
        }
    }
}
