use super::sendmail::{render, send_email, MailError};
use crate::config::Config;

const VERIFICATION_TEMPLATE: &str = include_str!("templates/verification-email.html");

pub fn verification_link(app_url: &str, token: &str) -> String {
    format!("{}/api/auth/verify?token={}", app_url.trim_end_matches('/'), token)
}

pub async fn send_verification_email(
    config: &Config,
    to_email: &str,
    name: &str,
    token: &str,
) -> Result<(), MailError> {
    let link = verification_link(&config.app_url, token);
    let html = render(
        VERIFICATION_TEMPLATE,
        &[("{{name}}", name), ("{{verification_link}}", &link)],
    );

    send_email(config, to_email, "Verifikasi Email Lapor Map", &html).await
}
