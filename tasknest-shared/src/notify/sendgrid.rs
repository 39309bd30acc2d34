/// SendGrid mail backend
///
/// Posts to the v3 `mail/send` endpoint with a bearer API key.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use super::{Message, Notifier, NotifyError};

const SENDGRID_API_URL: &str = "https://api.sendgrid.com/v3/mail/send";

#[derive(Debug, Serialize)]
struct SendGridAddress {
    email: String,
}

#[derive(Debug, Serialize)]
struct SendGridPersonalization {
    to: Vec<SendGridAddress>,
}

#[derive(Debug, Serialize)]
struct SendGridContent {
    #[serde(rename = "type")]
    content_type: &'static str,
    value: String,
}

#[derive(Debug, Serialize)]
struct SendGridRequest {
    personalizations: Vec<SendGridPersonalization>,
    from: SendGridAddress,
    subject: String,
    content: Vec<SendGridContent>,
}

/// Sends mail through SendGrid
pub struct SendGridNotifier {
    api_key: String,
    from: String,
    client: Client,
}

impl SendGridNotifier {
    /// Creates a notifier with its own HTTP client
    pub fn new(api_key: impl Into<String>, from: impl Into<String>) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| NotifyError::Send(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_key: api_key.into(),
            from: from.into(),
            client,
        })
    }

    fn build_request(&self, message: &Message) -> SendGridRequest {
        SendGridRequest {
            personalizations: vec![SendGridPersonalization {
                to: vec![SendGridAddress {
                    email: message.to.clone(),
                }],
            }],
            from: SendGridAddress {
                email: self.from.clone(),
            },
            subject: message.subject.clone(),
            content: vec![SendGridContent {
                content_type: "text/plain",
                value: message.text.clone(),
            }],
        }
    }
}

#[async_trait]
impl Notifier for SendGridNotifier {
    async fn send(&self, message: &Message) -> Result<(), NotifyError> {
        let request = self.build_request(message);

        let response = self
            .client
            .post(SENDGRID_API_URL)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| NotifyError::Send(format!("SendGrid API request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(NotifyError::Api(format!(
                "SendGrid API error ({}): {}",
                status, body
            )));
        }

        debug!(to = %message.to, subject = %message.subject, "Mail sent");
        Ok(())
    }
}
