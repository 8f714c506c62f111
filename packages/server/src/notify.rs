use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::MailConfig;
use crate::entity::user;

const WELCOME_SUBJECT: &str = "Welcome aboard";

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("mail API request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("mail API rejected the message ({status}): {body}")]
    Rejected { status: u16, body: String },
}

/// Sends user-facing notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_welcome(&self, user: &user::Model) -> Result<(), NotifyError>;
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
struct Mailbox {
    email: String,
    name: String,
}

#[derive(Debug, Serialize)]
struct EmailRequest {
    from: Mailbox,
    to: Vec<Mailbox>,
    reply_to: Mailbox,
    subject: String,
    html: String,
    text: String,
}

impl EmailRequest {
    fn welcome(sender: &Mailbox, user: &user::Model) -> Self {
        let full_name = user.full_name();
        Self {
            from: sender.clone(),
            to: vec![Mailbox {
                email: user.email.clone(),
                name: full_name.clone(),
            }],
            reply_to: sender.clone(),
            subject: WELCOME_SUBJECT.to_string(),
            html: format!("<strong>Welcome {full_name}</strong>"),
            text: format!("Welcome {full_name}"),
        }
    }
}

/// Delivers welcome emails through the MailerSend HTTP API.
pub struct MailerSendNotifier {
    client: Client,
    api_url: String,
    api_key: String,
    sender: Mailbox,
}

impl MailerSendNotifier {
    /// Requests that outlive `config.timeout_secs` fail instead of stalling shutdown.
    pub fn new(config: &MailConfig, api_key: String) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key,
            sender: Mailbox {
                email: config.sender_email.clone(),
                name: config.sender_name.clone(),
            },
        })
    }
}

#[async_trait]
impl Notifier for MailerSendNotifier {
    async fn send_welcome(&self, user: &user::Model) -> Result<(), NotifyError> {
        let body = EmailRequest::welcome(&self.sender, user);

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(NotifyError::Rejected { status, body });
        }

        debug!(user_id = %user.id, "Welcome email accepted by mail API");
        Ok(())
    }
}

/// Used when no mail API key is configured.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_welcome(&self, user: &user::Model) -> Result<(), NotifyError> {
        info!(
            user_id = %user.id,
            email = %user.email,
            "Mail delivery not configured, skipping welcome email"
        );
        Ok(())
    }
}
