//! Example: ask the review platform to invite one customer.
//!
//! # Prerequisites
//!
//! 1. An SMTP account allowed to send as `SMTP_SENDER`
//! 2. The review platform's unique invitation address
//!
//! # Usage
//!
//! ```bash
//! export SMTP_HOST="smtp.gmail.com"
//! export SMTP_PORT="587"
//! export SMTP_SENDER="noreply@yourdomain.com"
//! export SMTP_PASSWORD="app-password"
//! export REVIEW_DESTINATION="yourdomain.com+123456@invite.trustpilot.com"
//! cargo run --example send_review_invitation
//! ```

use review_invite_notification::{
    InvitationRequest, Notification, NotificationClient, NotificationSender, SenderConfig,
    SmtpPassword,
};

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn main() -> Result<(), review_invite_notification::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .init();

    let config = SenderConfig {
        smtp_host: env_or("SMTP_HOST", "localhost"),
        smtp_port: env_or("SMTP_PORT", "587").parse().unwrap_or(587),
        sender_address: env_or("SMTP_SENDER", "noreply@yourdomain.com"),
        sender_password: SmtpPassword::new(env_or("SMTP_PASSWORD", "")),
        destination_address: env_or(
            "REVIEW_DESTINATION",
            "yourdomain.com+123456@invite.trustpilot.com",
        ),
    };

    tracing::info!(host = %config.smtp_host, port = config.smtp_port, "Creating sender");
    let sender = NotificationSender::new(config);

    let notification = Notification::ReviewInvitation(InvitationRequest::new(
        "customer@example.com",
        "John Doe",
        "ORDER-1001",
    ));

    let delivery = sender.send_notification(&notification)?;

    tracing::info!(message_id = %delivery.message_id, "Invitation sent");
    Ok(())
}
