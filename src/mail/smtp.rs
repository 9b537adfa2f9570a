//! SMTP delivery over lettre's tokio transport

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Mailbox, Message};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Tokio1Executor};

use super::{EmailMessage, Mailer};
use crate::config::MailConfig;
use crate::error::{Error, Result};

pub struct SmtpMailer {
    from: Mailbox,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    /// Build the transport; no connection is made until the first send
    pub fn new(config: &MailConfig) -> Result<Self> {
        let server = config
            .server
            .as_deref()
            .ok_or_else(|| Error::Config("[mail] server is not set".to_string()))?;
        let from = sender(config)?;

        let builder = if config.ssl_tls {
            AsyncSmtpTransport::<Tokio1Executor>::relay(server)
        } else if config.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(server)
        } else {
            Ok(AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(server))
        }
        .map_err(|e| Error::Config(format!("Invalid SMTP server {}: {}", server, e)))?;

        let mut builder = builder.port(config.port);
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        tracing::info!("Sending mail through {}:{}", server, config.port);
        Ok(Self {
            from,
            transport: builder.build(),
        })
    }
}

fn sender(config: &MailConfig) -> Result<Mailbox> {
    let address: Address = config
        .from
        .parse()
        .map_err(|e| Error::Config(format!("Invalid [mail] from address {}: {}", config.from, e)))?;
    Ok(Mailbox::new(Some(config.from_name.clone()), address))
}

/// Turn `message` into an HTML email from `from`
fn compose(from: &Mailbox, message: &EmailMessage) -> Result<Message> {
    let to: Address = message
        .to
        .parse()
        .map_err(|e| Error::Mail(format!("Invalid recipient {}: {}", message.to, e)))?;

    Message::builder()
        .from(from.clone())
        .to(Mailbox::new(None, to))
        .subject(message.subject.clone())
        .header(ContentType::TEXT_HTML)
        .body(message.html.clone())
        .map_err(|e| Error::Mail(e.to_string()))
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        let email = compose(&self.from, message)?;
        let response = self
            .transport
            .send(email)
            .await
            .map_err(|e| Error::Mail(e.to_string()))?;
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            code = %response.code(),
            "Email sent"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn smtp_config() -> MailConfig {
        MailConfig {
            from: "bot@example.com".to_string(),
            server: Some("smtp.example.com".to_string()),
            username: Some("bot".to_string()),
            password: Some("pw".to_string()),
            ..MailConfig::default()
        }
    }

    #[test]
    fn test_compose_builds_html_message() {
        let from = sender(&smtp_config()).unwrap();
        let message =
            EmailMessage::verify_email("ann@example.com", "Ann", "http://localhost/", "tok").unwrap();

        let formatted = String::from_utf8(compose(&from, &message).unwrap().formatted()).unwrap();
        assert!(formatted.contains("Subject: Confirm your email"));
        assert!(formatted.contains("To: ann@example.com"));
        assert!(formatted.contains("bot@example.com"));
        assert!(formatted.contains("Content-Type: text/html"));
    }

    #[test]
    fn test_compose_rejects_bad_recipient() {
        let from = sender(&smtp_config()).unwrap();
        let message = EmailMessage::reset_password("not an address", "http://h/", "t").unwrap();
        assert!(matches!(compose(&from, &message), Err(Error::Mail(_))));
    }

    #[tokio::test]
    async fn test_new_requires_server_and_valid_sender() {
        assert!(matches!(
            SmtpMailer::new(&MailConfig::default()),
            Err(Error::Config(_))
        ));

        let mut config = smtp_config();
        config.from = "nobody".to_string();
        assert!(matches!(SmtpMailer::new(&config), Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_new_builds_transport_without_connecting() {
        assert!(SmtpMailer::new(&smtp_config()).is_ok());

        let mut implicit_tls = smtp_config();
        implicit_tls.ssl_tls = true;
        implicit_tls.port = 465;
        assert!(SmtpMailer::new(&implicit_tls).is_ok());
    }
}
