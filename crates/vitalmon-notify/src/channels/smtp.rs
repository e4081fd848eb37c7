use crate::error::{NotifyError, Result};
use crate::{DeliveryReceipt, EmailMessage, EmailTransport};
use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;

/// Upper bound for [`SmtpSettings::max_attempts`].
pub const MAX_ATTEMPTS: u32 = 10;

const BASE_BACKOFF_MS: u64 = 100;

/// Delay before retry number `attempt + 1`: 100ms doubled per attempt,
/// capped at the delay for the last allowed attempt.
fn backoff_delay(attempt: u32) -> Duration {
    let exponent = attempt.min(MAX_ATTEMPTS - 1);
    Duration::from_millis(BASE_BACKOFF_MS << exponent)
}

/// Connection settings for [`SmtpTransport`].
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
    /// Upgrade the connection with STARTTLS.
    pub starttls: bool,
    /// Connect over TLS from the start (SMTPS).
    pub implicit_tls: bool,
    /// Total send attempts per message, clamped to `1..=MAX_ATTEMPTS`.
    pub max_attempts: u32,
}

pub struct SmtpTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    message_domain: String,
    max_attempts: u32,
}

impl SmtpTransport {
    pub fn new(settings: &SmtpSettings) -> Result<Self> {
        if settings.host.is_empty() {
            return Err(NotifyError::InvalidConfig("smtp host is empty".into()));
        }
        let from: Mailbox = settings.from.parse()?;

        let builder = if settings.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)?
        } else if settings.implicit_tls {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.host)
        };
        let mut builder = builder.port(settings.port);

        if let (Some(user), Some(pass)) = (&settings.username, &settings.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            message_domain: from.email.domain().to_string(),
            from,
            max_attempts: settings.max_attempts.clamp(1, MAX_ATTEMPTS),
        })
    }

    fn build(&self, message: &EmailMessage, message_id: &str) -> Result<Message> {
        Ok(Message::builder()
            .from(self.from.clone())
            .to(message.to.parse()?)
            .subject(&message.subject)
            .message_id(Some(message_id.to_string()))
            .multipart(MultiPart::alternative_plain_html(
                message.text_body.clone(),
                message.html_body.clone(),
            ))?)
    }
}

#[async_trait]
impl EmailTransport for SmtpTransport {
    async fn send(&self, message: &EmailMessage) -> Result<DeliveryReceipt> {
        let message_id = vitalmon_common::id::message_id(&self.message_domain);
        let email = self.build(message, &message_id)?;

        let mut last_err = None;
        for attempt in 0..self.max_attempts {
            match self.transport.send(email.clone()).await {
                Ok(_) => {
                    tracing::debug!(
                        to = %message.to,
                        message_id = %message_id,
                        "Email accepted by relay"
                    );
                    return Ok(DeliveryReceipt { message_id });
                }
                Err(e) => {
                    tracing::warn!(
                        attempt = attempt + 1,
                        to = %message.to,
                        error = %e,
                        "Email send failed, retrying"
                    );
                    last_err = Some(e);
                    if attempt + 1 < self.max_attempts {
                        tokio::time::sleep(backoff_delay(attempt)).await;
                    }
                }
            }
        }

        let err = last_err.map_or_else(
            || NotifyError::Smtp("no send attempt made".into()),
            NotifyError::from,
        );
        tracing::error!(
            to = %message.to,
            attempts = self.max_attempts,
            error = %err,
            "Email send failed after retries"
        );
        Err(err)
    }

    fn transport_name(&self) -> &str {
        "smtp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> SmtpSettings {
        SmtpSettings {
            host: "localhost".into(),
            port: 2525,
            username: None,
            password: None,
            from: "Vitalmon <alerts@clinic.example>".into(),
            starttls: false,
            implicit_tls: false,
            max_attempts: 3,
        }
    }

    #[tokio::test]
    async fn builds_multipart_message_with_own_message_id() {
        let transport = SmtpTransport::new(&settings()).unwrap();
        let msg = EmailMessage {
            to: "pat@example.com".into(),
            subject: "Critical health alert".into(),
            html_body: "<p>High Heart Rate</p>".into(),
            text_body: "High Heart Rate".into(),
        };
        let built = transport.build(&msg, "<1@clinic.example>").unwrap();
        let raw = String::from_utf8(built.formatted()).unwrap();

        assert!(raw.contains("Message-ID: <1@clinic.example>"));
        assert!(raw.contains("multipart/alternative"));
        assert!(raw.contains("To: pat@example.com"));
    }

    #[tokio::test]
    async fn rejects_bad_addresses() {
        let mut bad_from = settings();
        bad_from.from = "not an address".into();
        assert!(matches!(
            SmtpTransport::new(&bad_from),
            Err(NotifyError::Address(_))
        ));

        let transport = SmtpTransport::new(&settings()).unwrap();
        let msg = EmailMessage {
            to: "nobody".into(),
            subject: "s".into(),
            html_body: String::new(),
            text_body: String::new(),
        };
        assert!(matches!(
            transport.build(&msg, "<1@x>"),
            Err(NotifyError::Address(_))
        ));
    }

    #[test]
    fn backoff_doubles_and_stays_bounded() {
        assert_eq!(backoff_delay(0), Duration::from_millis(100));
        assert_eq!(backoff_delay(1), Duration::from_millis(200));
        assert_eq!(backoff_delay(3), Duration::from_millis(800));
        assert_eq!(backoff_delay(u32::MAX), backoff_delay(MAX_ATTEMPTS - 1));
    }

    #[tokio::test]
    async fn attempts_are_clamped() {
        let mut s = settings();
        s.max_attempts = u32::MAX;
        assert_eq!(SmtpTransport::new(&s).unwrap().max_attempts, MAX_ATTEMPTS);
        s.max_attempts = 0;
        assert_eq!(SmtpTransport::new(&s).unwrap().max_attempts, 1);
    }

    #[tokio::test]
    async fn empty_host_is_invalid_config() {
        let mut s = settings();
        s.host.clear();
        assert!(matches!(
            SmtpTransport::new(&s),
            Err(NotifyError::InvalidConfig(_))
        ));
    }
}
