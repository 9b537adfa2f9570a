//! Outgoing email

mod smtp;
pub mod templates;

pub use smtp::SmtpMailer;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::config::MailConfig;
use crate::error::Result;

/// SMTP when a mail server is configured, the log otherwise
pub fn from_config(config: &MailConfig) -> Result<Arc<dyn Mailer>> {
    if config.server.is_some() {
        return Ok(Arc::new(SmtpMailer::new(config)?));
    }
    tracing::warn!("No [mail] server configured, outgoing mail only goes to the log");
    Ok(Arc::new(LogMailer::new(config)))
}

/// A rendered email ready for delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

impl EmailMessage {
    pub fn verify_email(to: &str, username: &str, host: &str, token: &str) -> Result<Self> {
        Ok(Self {
            to: to.to_string(),
            subject: "Confirm your email".to_string(),
            html: templates::render_verify_email(host, username, token)?,
        })
    }

    pub fn reset_password(to: &str, host: &str, token: &str) -> Result<Self> {
        Ok(Self {
            to: to.to_string(),
            subject: "Reset your password".to_string(),
            html: templates::render_reset_password(host, token)?,
        })
    }
}

/// Email transport
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<()>;
}

/// Writes every message, links included, to the log instead of delivering it
pub struct LogMailer {
    from: String,
}

impl LogMailer {
    pub fn new(config: &MailConfig) -> Self {
        Self {
            from: format!("{} <{}>", config.from_name, config.from),
        }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        tracing::info!(
            from = %self.from,
            to = %message.to,
            subject = %message.subject,
            "Outgoing email"
        );
        tracing::info!("{}", message.html);
        Ok(())
    }
}

/// Keeps sent messages in memory
#[derive(Clone, Default)]
pub struct MemoryMailer {
    sent: Arc<Mutex<Vec<EmailMessage>>>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().await.clone()
    }

    /// Poll until at least `count` messages arrived or `timeout` passed
    pub async fn wait_for(&self, count: usize, timeout: Duration) -> Vec<EmailMessage> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let sent = self.sent().await;
            if sent.len() >= count || tokio::time::Instant::now() >= deadline {
                return sent;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        self.sent.lock().await.push(message.clone());
        Ok(())
    }
}

/// Deliver in the background; failures are logged, never returned
pub fn dispatch(mailer: Arc<dyn Mailer>, message: EmailMessage) {
    tokio::spawn(async move {
        if let Err(e) = mailer.send(&message).await {
            tracing::error!("Failed to send '{}' to {}: {}", message.subject, message.to, e);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_mailer_records() {
        let mailer = MemoryMailer::new();
        let message =
            EmailMessage::verify_email("a@x.com", "Ann", "http://localhost/", "tok.en").unwrap();
        mailer.send(&message).await.unwrap();

        let sent = mailer.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "Confirm your email");
    }

    #[tokio::test]
    async fn test_log_mailer_without_smtp_server() {
        let mailer = from_config(&MailConfig::default()).unwrap();
        let message = EmailMessage::reset_password("a@x.com", "http://localhost/", "t").unwrap();
        assert!(mailer.send(&message).await.is_ok());
    }

    #[tokio::test]
    async fn test_dispatch_delivers_in_background() {
        let mailer = MemoryMailer::new();
        let message = EmailMessage::reset_password("a@x.com", "http://localhost/", "t").unwrap();
        dispatch(Arc::new(mailer.clone()), message);

        let sent = mailer.wait_for(1, Duration::from_secs(1)).await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "a@x.com");
    }
}
