//! Connection context shared by every subscription.
//!
//! The embedding application owns a [`CoreContext`] and publishes changes
//! through a `tokio::sync::watch` channel. Subscriptions restart whenever a
//! field that affects them changes.

use livelog_types::{InstanceUuid, Principal};
use reqwest::Url;

use crate::error::ClientError;

/// Default port of the core server.
pub const DEFAULT_PORT: u16 = 16662;

/// Default API version segment.
pub const DEFAULT_API_VERSION: &str = "v1";

/// Where the core lives and who we are talking to it as.
#[derive(Clone, PartialEq, Eq)]
pub struct CoreContext {
    /// Host name or IP address of the core.
    pub address: String,
    /// Port of the core.
    pub port: u16,
    /// API version path segment, e.g. `v1`.
    pub api_version: String,
    /// Use `https`/`wss` instead of `http`/`ws`.
    pub tls: bool,
    /// Whether the context is complete enough to connect.
    pub ready: bool,
    /// Bearer token.
    pub token: String,
    /// The authenticated user, if known.
    pub principal: Option<Principal>,
}

impl CoreContext {
    /// A context for the given core, not yet ready.
    pub fn new(address: &str, port: u16) -> Self {
        Self {
            address: address.to_string(),
            port,
            ..Self::default()
        }
    }

    /// Set the bearer token.
    pub fn with_token(mut self, token: &str) -> Self {
        self.token = token.to_string();
        self
    }

    /// Set the authenticated user.
    pub fn with_principal(mut self, principal: Principal) -> Self {
        self.principal = Some(principal);
        self
    }

    /// Set the API version segment.
    pub fn with_api_version(mut self, api_version: &str) -> Self {
        self.api_version = api_version.to_string();
        self
    }

    /// Enable or disable TLS.
    pub fn with_tls(mut self, tls: bool) -> Self {
        self.tls = tls;
        self
    }

    /// Mark the context as ready.
    pub fn ready(mut self) -> Self {
        self.ready = true;
        self
    }

    /// `GET` endpoint for the console buffer of `target`.
    pub fn buffer_url(&self, target: &InstanceUuid) -> Result<Url, ClientError> {
        let scheme = if self.tls { "https" } else { "http" };
        self.url(scheme, &["instance", target.as_str(), "console", "buffer"])
    }

    /// `GET` endpoint returning the authenticated user.
    pub fn user_info_url(&self) -> Result<Url, ClientError> {
        let scheme = if self.tls { "https" } else { "http" };
        self.url(scheme, &["user", "info"])
    }

    /// WebSocket endpoint for the live console of `target`.
    ///
    /// The token travels in the query string as `token=Bearer <token>`.
    /// Never log this URL.
    pub fn stream_url(&self, target: &InstanceUuid) -> Result<Url, ClientError> {
        let scheme = if self.tls { "wss" } else { "ws" };
        let mut url = self.url(scheme, &["instance", target.as_str(), "console", "stream"])?;
        url.query_pairs_mut()
            .append_pair("token", &format!("Bearer {}", self.token));
        Ok(url)
    }

    fn url(&self, scheme: &str, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = Url::parse(&format!("{}://{}:{}/", scheme, self.address, self.port))
            .map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(format!("{} cannot carry a path", self.address)))?
            .clear()
            .push("api")
            .push(&self.api_version)
            .extend(segments);
        Ok(url)
    }
}

impl Default for CoreContext {
    fn default() -> Self {
        Self {
            address: "localhost".to_string(),
            port: DEFAULT_PORT,
            api_version: DEFAULT_API_VERSION.to_string(),
            tls: false,
            ready: false,
            token: String::new(),
            principal: None,
        }
    }
}

impl std::fmt::Debug for CoreContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreContext")
            .field("address", &self.address)
            .field("port", &self.port)
            .field("api_version", &self.api_version)
            .field("tls", &self.tls)
            .field("ready", &self.ready)
            .field("token", &format!("[{} chars REDACTED]", self.token.len()))
            .field("principal", &self.principal.as_ref().map(|p| &p.username))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> CoreContext {
        CoreContext::new("core.local", 16662).with_token("abc.def")
    }

    #[test]
    fn defaults_point_at_local_core() {
        let ctx = CoreContext::default();
        assert_eq!(ctx.address, "localhost");
        assert_eq!(ctx.port, DEFAULT_PORT);
        assert_eq!(ctx.api_version, "v1");
        assert!(!ctx.ready);
        assert!(ctx.principal.is_none());
    }

    #[test]
    fn buffer_url_layout() {
        let url = context()
            .buffer_url(&InstanceUuid::from("INSTANCE_abc"))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://core.local:16662/api/v1/instance/INSTANCE_abc/console/buffer"
        );
    }

    #[test]
    fn stream_url_layout() {
        let url = context()
            .stream_url(&InstanceUuid::from("INSTANCE_abc"))
            .unwrap();
        assert_eq!(url.scheme(), "ws");
        assert_eq!(url.path(), "/api/v1/instance/INSTANCE_abc/console/stream");

        let token: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(token, vec![("token".to_string(), "Bearer abc.def".to_string())]);
    }

    #[test]
    fn tls_switches_schemes() {
        let ctx = context().with_tls(true);
        let target = InstanceUuid::from("x");
        assert_eq!(ctx.buffer_url(&target).unwrap().scheme(), "https");
        assert_eq!(ctx.stream_url(&target).unwrap().scheme(), "wss");
    }

    #[test]
    fn api_version_is_configurable() {
        let url = context().with_api_version("v2").user_info_url().unwrap();
        assert_eq!(url.path(), "/api/v2/user/info");
    }

    #[test]
    fn target_is_percent_encoded() {
        let url = context()
            .buffer_url(&InstanceUuid::from("a b/c"))
            .unwrap();
        assert_eq!(url.path(), "/api/v1/instance/a%20b%2Fc/console/buffer");
    }

    #[test]
    fn bad_address_is_rejected() {
        let ctx = CoreContext::new("not a host", 1);
        assert!(matches!(
            ctx.buffer_url(&InstanceUuid::from("x")),
            Err(ClientError::InvalidUrl(_))
        ));
    }

    #[test]
    fn debug_redacts_token() {
        let debug = format!("{:?}", context());
        assert!(debug.contains("[7 chars REDACTED]"));
        assert!(!debug.contains("abc.def"));
    }
}
