use crate::base::neterror::NetError;
use crate::http::HttpResponse;
use crate::socket::connectjob::ConnectJob;
use bytes::Bytes;
use http::{HeaderMap, HeaderValue, Method, Request};
use http_body_util::Empty;
use hyper::client::conn::http1;
use hyper_util::rt::TokioIo;
use std::sync::Arc;
use tokio::spawn;
use url::{Position, Url};

/// Wraps one HTTP/1.1 connection.
/// Equivalent to net::HttpStream.
pub struct HttpStream {
    sender: http1::SendRequest<Empty<Bytes>>,
}

impl HttpStream {
    pub async fn send_request(
        &mut self,
        req: Request<Empty<Bytes>>,
    ) -> Result<HttpResponse, NetError> {
        let response = self.sender.send_request(req).await.map_err(|e| {
            tracing::debug!(error = %e, "request failed");
            NetError::ConnectionClosed
        })?;
        Ok(HttpResponse::from_hyper(response))
    }

    /// Sends a bodiless `GET` for `url`.
    pub async fn get(&mut self, url: &Url, headers: HeaderMap) -> Result<HttpResponse, NetError> {
        let req = build_request(Method::GET, url, headers)?;
        self.send_request(req).await
    }
}

/// Origin-form request for `url` with a `Host` header. Caller headers win
/// over the default `Host`.
pub fn build_request(
    method: Method,
    url: &Url,
    headers: HeaderMap,
) -> Result<Request<Empty<Bytes>>, NetError> {
    let target = &url[Position::BeforePath..];
    let authority = &url[Position::BeforeHost..Position::AfterPort];

    let mut req = Request::builder()
        .method(method)
        .uri(target)
        .body(Empty::new())
        .map_err(|_| NetError::InvalidUrl)?;

    let host = HeaderValue::from_str(authority).map_err(|_| NetError::InvalidUrl)?;
    req.headers_mut().insert(http::header::HOST, host);
    req.headers_mut().extend(headers);
    Ok(req)
}

#[derive(Clone, Debug)]
pub struct HttpStreamFactory {
    connect_job: Arc<ConnectJob>,
}

impl HttpStreamFactory {
    pub fn new(connect_job: Arc<ConnectJob>) -> Self {
        Self { connect_job }
    }

    pub fn connect_job(&self) -> &ConnectJob {
        &self.connect_job
    }

    pub async fn request_stream(&self, url: &Url) -> Result<HttpStream, NetError> {
        // 1. Get raw socket
        let socket = self.connect_job.connect(url).await?;

        // 2. Handshake (HTTP/1.1 only)
        let io = TokioIo::new(socket);
        let (sender, conn) = http1::handshake(io).await.map_err(|e| {
            tracing::debug!(error = %e, "HTTP/1.1 handshake failed");
            NetError::ConnectionFailed
        })?;

        // 3. Spawn the connection driver
        spawn(async move {
            if let Err(e) = conn.await {
                tracing::debug!(error = %e, "connection closed with error");
            }
        });

        Ok(HttpStream { sender })
    }
}
