use serde_json::json;
use thiserror::Error;
use tokio::time::{sleep, Duration};

use crate::config::Config;

const MAX_RETRIES: u32 = 3;
const RETRY_DELAY_MS: u64 = 1000;
const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";

#[derive(Error, Debug)]
pub enum MailError {
    #[error("Invalid email address: {0}")]
    InvalidRecipient(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Resend API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Failed after {0} retries: {1}")]
    RetriesExhausted(u32, Box<MailError>),
}

pub fn render(template: &str, placeholders: &[(&str, &str)]) -> String {
    placeholders
        .iter()
        .fold(template.to_string(), |html, (key, value)| html.replace(key, value))
}

/// Sends an HTML mail through Resend. Without an API key the mail is only
/// logged and `Ok` is returned.
pub async fn send_email(
    config: &Config,
    to_email: &str,
    subject: &str,
    html_body: &str,
) -> Result<(), MailError> {
    if to_email.is_empty() || !to_email.contains('@') {
        return Err(MailError::InvalidRecipient(to_email.to_string()));
    }

    let Some(api_key) = config.resend_api_key.as_deref() else {
        tracing::warn!("RESEND_API_KEY not set, skipping mail \"{}\" to {}", subject, to_email);
        return Ok(());
    };

    let client = reqwest::Client::new();
    let mut last_error = None;

    for attempt in 1..=MAX_RETRIES {
        match send_via_resend(&client, api_key, &config.from_email, to_email, subject, html_body)
            .await
        {
            Ok(email_id) => {
                tracing::info!("Email sent to {} (id: {})", to_email, email_id);
                return Ok(());
            }
            Err(e) => {
                if attempt < MAX_RETRIES {
                    let delay = RETRY_DELAY_MS * 2_u64.pow(attempt - 1);
                    tracing::warn!(
                        "Email send attempt {} failed for {}: {}. Retrying in {}ms...",
                        attempt,
                        to_email,
                        e,
                        delay
                    );
                    sleep(Duration::from_millis(delay)).await;
                }
                last_error = Some(e);
            }
        }
    }

    let error = match last_error {
        Some(e) => MailError::RetriesExhausted(MAX_RETRIES, Box::new(e)),
        None => MailError::InvalidRecipient(to_email.to_string()),
    };
    tracing::error!("Email failed for {}: {}", to_email, error);
    Err(error)
}

async fn send_via_resend(
    client: &reqwest::Client,
    api_key: &str,
    from_email: &str,
    to_email: &str,
    subject: &str,
    html_body: &str,
) -> Result<String, MailError> {
    let request_body = json!({
        "from": from_email,
        "to": to_email,
        "subject": subject,
        "html": html_body,
    });

    let response = client
        .post(RESEND_ENDPOINT)
        .bearer_auth(api_key)
        .json(&request_body)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(MailError::Api {
            status: status.as_u16(),
            body,
        });
    }

    let body: serde_json::Value = response.json().await?;
    Ok(body["id"].as_str().unwrap_or("unknown").to_string())
}
