//! Resolving the authenticated user.
//!
//! The subscription never looks the principal up itself; it reads
//! [`CoreContext::principal`]. This module is for embedders (and the CLI)
//! that need to fill that field from the core.

use async_trait::async_trait;
use livelog_types::Principal;

use crate::context::CoreContext;
use crate::error::ClientError;

/// Supplies the principal for a context.
#[async_trait]
pub trait PrincipalSource: Send + Sync {
    /// The user the context's token belongs to, or `None` if there is none.
    async fn principal(&self, context: &CoreContext) -> Result<Option<Principal>, ClientError>;
}

/// Reads the principal from the core's user info endpoint.
#[derive(Debug, Clone, Default)]
pub struct HttpPrincipalSource {
    http: reqwest::Client,
}

impl HttpPrincipalSource {
    /// Create a source with a fresh HTTP client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an existing HTTP client.
    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl PrincipalSource for HttpPrincipalSource {
    async fn principal(&self, context: &CoreContext) -> Result<Option<Principal>, ClientError> {
        if context.token.is_empty() {
            return Ok(None);
        }

        let url = context.user_info_url()?;
        let response = self
            .http
            .get(url)
            .bearer_auth(&context.token)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            tracing::info!("token rejected by core");
            return Ok(None);
        }

        if !response.status().is_success() {
            return Err(ClientError::Status {
                status: response.status().as_u16(),
                path: response.url().path().to_string(),
            });
        }

        let principal: Principal = response.json().await?;
        tracing::debug!(user = %principal.username, "resolved principal");
        Ok(Some(principal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    async fn serve_once(status: &'static str, body: &'static str) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let _ = socket.read(&mut buf).await.unwrap();
            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });
        port
    }

    #[tokio::test]
    async fn empty_token_has_no_principal() {
        let context = CoreContext::new("127.0.0.1", 1);
        let principal = HttpPrincipalSource::new().principal(&context).await.unwrap();
        assert!(principal.is_none());
    }

    #[tokio::test]
    async fn reads_user_info() {
        let port = serve_once(
            "200 OK",
            r#"{"uid":"u1","username":"alice","is_admin":true}"#,
        )
        .await;
        let context = CoreContext::new("127.0.0.1", port).with_token("tok");

        let principal = HttpPrincipalSource::new()
            .principal(&context)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(principal.username, "alice");
        assert!(principal.is_admin);
        assert!(!principal.is_owner);
    }

    #[tokio::test]
    async fn unauthorized_means_no_principal() {
        let port = serve_once("401 Unauthorized", "{}").await;
        let context = CoreContext::new("127.0.0.1", port).with_token("stale");

        let principal = HttpPrincipalSource::new().principal(&context).await.unwrap();
        assert!(principal.is_none());
    }

    #[tokio::test]
    async fn server_error_is_an_error() {
        let port = serve_once("500 Internal Server Error", "{}").await;
        let context = CoreContext::new("127.0.0.1", port).with_token("tok");

        let result = HttpPrincipalSource::new().principal(&context).await;
        assert!(matches!(result, Err(ClientError::Status { status: 500, .. })));
    }
}
