use async_trait::async_trait;
use serde::Serialize;

use super::{DispatchError, EmailMessage, EmailSender};

/// Template names understood by the email provider.
pub mod templates {
    pub const FREELANCE_APPLIED: &str = "freelance_applied";
    pub const APPLICATION_WITHDRAWN: &str = "application_withdrawn";
    pub const APPLICATION_ACCEPTED: &str = "application_accepted";
    pub const APPLICATION_REJECTED: &str = "application_rejected";
    pub const CONTRACT_PROPOSED: &str = "contract_proposed";
    pub const CONTRACT_UPDATED: &str = "contract_updated";
    pub const CONTRACT_ACCEPTED: &str = "contract_accepted";
    pub const CONTRACT_REJECTED: &str = "contract_rejected";
    pub const CONTRACT_COMPLETED: &str = "contract_completed";
    pub const PROJECT_INVITATION: &str = "project_invitation";
}

/// Sends templated emails through an HTTP email API.
#[derive(Clone)]
pub struct HttpEmailSender {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    from: String,
}

#[derive(Serialize)]
struct EmailRequest<'a> {
    from: &'a str,
    to: &'a str,
    template: &'a str,
    args: &'a serde_json::Value,
}

impl HttpEmailSender {
    pub fn new(endpoint: &str, api_key: &str, from: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
            from: from.to_string(),
        }
    }
}

#[async_trait]
impl EmailSender for HttpEmailSender {
    async fn send(&self, message: EmailMessage) -> Result<(), DispatchError> {
        let request = EmailRequest {
            from: &self.from,
            to: &message.to,
            template: &message.template,
            args: &message.args,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DispatchError::Transport(format!(
                "email API answered HTTP {status}"
            )));
        }

        tracing::debug!(template = %message.template, "email sent");
        Ok(())
    }
}

/// Used when no email API is configured: logs and drops every message.
#[derive(Clone, Default)]
pub struct DisabledEmailSender;

#[async_trait]
impl EmailSender for DisabledEmailSender {
    async fn send(&self, message: EmailMessage) -> Result<(), DispatchError> {
        tracing::debug!(template = %message.template, "email delivery disabled, dropping message");
        Ok(())
    }
}
