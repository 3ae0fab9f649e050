use async_trait::async_trait;
use lettre::{
    message::header::ContentType,
    transport::smtp::{
        authentication::Credentials,
        client::{Tls, TlsParameters},
        PoolConfig,
    },
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::info;

use crate::config::SmtpConfig;

/// Outbound mail. A send failure surfaces as a request error to the caller;
/// nothing is queued or retried here.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()>;
}

/// SMTP delivery over STARTTLS with a small connection pool.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> anyhow::Result<Self> {
        let tls = TlsParameters::builder(config.host.clone()).build()?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .tls(Tls::Required(tls))
            .pool_config(PoolConfig::new().max_size(1))
            .timeout(Some(std::time::Duration::from_secs(10)))
            .build();
        Ok(Self {
            transport,
            from: config.from.clone(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()> {
        let email = Message::builder()
            .from(self.from.parse()?)
            .to(to.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())?;

        self.transport.send(email).await?;
        info!(to = %to, subject = %subject, "email sent");
        Ok(())
    }
}

/// Dev fallback used when SMTP is not configured: logs the message and
/// reports success.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()> {
        info!(to = %to, subject = %subject, body = %body, "smtp not configured, logging email instead");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn log_mailer_always_succeeds() {
        LogMailer
            .send("user@example.com", "Password reset request", "hello")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn smtp_mailer_builds_from_config() {
        let mailer = SmtpMailer::new(&SmtpConfig {
            host: "smtp.example.com".into(),
            port: 587,
            username: "mailer@example.com".into(),
            password: "app-password".into(),
            from: "Blog <mailer@example.com>".into(),
        })
        .unwrap();
        assert_eq!(mailer.from, "Blog <mailer@example.com>");
    }
}
