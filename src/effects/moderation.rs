use async_trait::async_trait;

use super::{ContentModerator, DispatchError, ModerationVerdict};

/// Asks an HTTP moderation service whether a text is fit for publication.
#[derive(Clone)]
pub struct HttpContentModerator {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpContentModerator {
    pub fn new(endpoint: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.to_string(),
        }
    }
}

#[async_trait]
impl ContentModerator for HttpContentModerator {
    async fn check(&self, text: &str) -> Result<ModerationVerdict, DispatchError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DispatchError::Transport(format!(
                "moderation API answered HTTP {status}"
            )));
        }

        Ok(response.json::<ModerationVerdict>().await?)
    }
}

/// Approves everything. Used when no moderation service is configured.
#[derive(Clone, Default)]
pub struct AllowAllModerator;

#[async_trait]
impl ContentModerator for AllowAllModerator {
    async fn check(&self, _text: &str) -> Result<ModerationVerdict, DispatchError> {
        Ok(ModerationVerdict::approved())
    }
}
