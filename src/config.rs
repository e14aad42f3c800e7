//! File-based interception configuration.
//!
//! ```json
//! {
//!   "hosts": ["www.pixiv.net", "i.pximg.net"],
//!   "doh_endpoint": "https://cloudflare-dns.com/dns-query",
//!   "doh_query_type": "A",
//!   "doh_timeout_ms": 5000
//! }
//! ```
//!
//! Only `hosts` is required.

use crate::base::neterror::NetError;
use crate::dns::{DohConfig, RecordType};
use crate::interception::InterceptionContext;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InterceptionConfig {
    pub hosts: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doh_endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doh_query_type: Option<RecordType>,
    /// `0` disables the timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doh_timeout_ms: Option<u64>,
}

impl InterceptionConfig {
    pub fn from_json_str(json: &str) -> Result<Self, NetError> {
        serde_json::from_str(json).map_err(|e| NetError::InvalidConfig(e.to_string()))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, NetError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| NetError::InvalidConfig(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&json)
    }

    /// The DoH settings, with defaults for anything unset.
    pub fn doh_config(&self) -> Result<DohConfig, NetError> {
        let mut builder = DohConfig::builder();
        if let Some(endpoint) = &self.doh_endpoint {
            builder = builder
                .endpoint(endpoint)
                .map_err(|e| NetError::InvalidConfig(format!("doh_endpoint {endpoint:?}: {e}")))?;
        }
        if let Some(query_type) = self.doh_query_type {
            builder = builder.query_type(query_type);
        }
        match self.doh_timeout_ms {
            Some(0) => builder = builder.no_timeout(),
            Some(ms) => builder = builder.timeout(Duration::from_millis(ms)),
            None => {}
        }
        Ok(builder.build())
    }

    /// Builds a context over HTTPS with every configured host registered.
    pub fn into_context(self) -> Result<InterceptionContext, NetError> {
        let ctx = InterceptionContext::new(self.doh_config()?)?;
        ctx.add_hosts(&self.hosts);
        tracing::debug!(hosts = self.hosts.len(), "interception context configured");
        Ok(ctx)
    }
}
