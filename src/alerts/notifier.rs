use crate::config::NotifierConfig;
use crate::error::{AlertError, ConfigError};
use log::{info, warn};
use reqwest::Client;
use serde::Serialize;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

/// Transport that delivers an alert message to one target
pub trait Notifier: Send + Sync {
    fn send<'a>(
        &'a self,
        target: &'a str,
        message: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<(), AlertError>> + Send + 'a>>;
}

/// Build the notifier selected in the configuration
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` if the HTTP client for the webhook
/// backend cannot be constructed.
pub fn from_config(config: &NotifierConfig) -> Result<Arc<dyn Notifier>, ConfigError> {
    match config {
        NotifierConfig::Log => Ok(Arc::new(LogNotifier)),
        NotifierConfig::Webhook {
            url,
            timeout_seconds,
        } => Ok(Arc::new(WebhookNotifier::new(
            url.clone(),
            Duration::from_secs(*timeout_seconds),
        )?)),
    }
}

/// Writes alerts to the application log
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send<'a>(
        &'a self,
        target: &'a str,
        message: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<(), AlertError>> + Send + 'a>> {
        Box::pin(async move {
            warn!("ALERT -> {}: {}", target, message.replace('\n', " | "));
            Ok(())
        })
    }
}

/// Body of a webhook delivery
#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    target: &'a str,
    message: &'a str,
}

/// Posts alerts as JSON to an HTTP endpoint
///
/// The endpoint receives `{"target": "...", "message": "..."}` once per
/// target and must answer with a 2xx status.
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    /// Create a webhook notifier
    ///
    /// # Arguments
    /// * `url` - Endpoint receiving the JSON payload
    /// * `timeout` - Upper bound for a single delivery
    pub fn new(url: String, timeout: Duration) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::ValidationError(format!("webhook client: {}", e)))?;

        Ok(Self { client, url })
    }

    async fn post(&self, target: &str, message: &str) -> Result<(), AlertError> {
        let response = self
            .client
            .post(&self.url)
            .json(&WebhookPayload { target, message })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AlertError::NotificationFailed(format!(
                "webhook returned {} for {}: {}",
                status, target, body
            )));
        }

        info!("Delivered alert to {} via webhook", target);
        Ok(())
    }
}

impl Notifier for WebhookNotifier {
    fn send<'a>(
        &'a self,
        target: &'a str,
        message: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<(), AlertError>> + Send + 'a>> {
        Box::pin(self.post(target, message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Accept one HTTP request, answer with `status_line`, and return the raw request
    async fn serve_once(listener: TcpListener, status_line: &'static str) -> String {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 4096];

        loop {
            let n = socket.read(&mut buf).await.unwrap();
            request.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&request);
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|l| {
                        l.to_ascii_lowercase()
                            .strip_prefix("content-length:")
                            .map(|v| v.trim().parse::<usize>().unwrap())
                    })
                    .unwrap_or(0);
                if request.len() >= header_end + 4 + content_length {
                    break;
                }
            }
            if n == 0 {
                break;
            }
        }

        let response = format!("{}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n", status_line);
        socket.write_all(response.as_bytes()).await.unwrap();
        String::from_utf8_lossy(&request).into_owned()
    }

    #[tokio::test]
    async fn test_log_notifier_always_succeeds() {
        assert!(LogNotifier.send("ops", "line one\nline two").await.is_ok());
    }

    #[tokio::test]
    async fn test_webhook_posts_json_payload() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/alert", listener.local_addr().unwrap());
        let server = tokio::spawn(serve_once(listener, "HTTP/1.1 200 OK"));

        let notifier = WebhookNotifier::new(url, Duration::from_secs(5)).unwrap();
        notifier.send("ops-room", "CPU hot").await.unwrap();

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /alert"));
        assert!(request.contains(r#""target":"ops-room""#));
        assert!(request.contains(r#""message":"CPU hot""#));
    }

    #[tokio::test]
    async fn test_webhook_error_status_is_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/alert", listener.local_addr().unwrap());
        let server = tokio::spawn(serve_once(listener, "HTTP/1.1 500 Internal Server Error"));

        let notifier = WebhookNotifier::new(url, Duration::from_secs(5)).unwrap();
        let result = notifier.send("ops-room", "CPU hot").await;
        server.await.unwrap();

        assert!(matches!(result, Err(AlertError::NotificationFailed(_))));
    }

    #[tokio::test]
    async fn test_webhook_unreachable_endpoint() {
        // Bind then drop to get a port with nothing listening
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/alert", listener.local_addr().unwrap());
        drop(listener);

        let notifier = WebhookNotifier::new(url, Duration::from_secs(2)).unwrap();
        assert!(matches!(
            notifier.send("ops-room", "CPU hot").await,
            Err(AlertError::HttpError(_))
        ));
    }

    #[test]
    fn test_from_config() {
        assert!(from_config(&NotifierConfig::Log).is_ok());
        assert!(from_config(&NotifierConfig::Webhook {
            url: "http://localhost:9/alert".to_string(),
            timeout_seconds: 1,
        })
        .is_ok());
    }
}
