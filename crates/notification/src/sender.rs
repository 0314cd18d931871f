use serde::{Deserialize, Serialize};

use crate::{
    build_invitation_email,
    transport::{Connector, Endpoint, Session, SessionGuard, SmtpConnector},
    Error, InvitationRequest, Notification, NotificationClient, SmtpPassword,
};

/// Connection parameters of a [`NotificationSender`].
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SenderConfig {
    /// SMTP server host name.
    pub smtp_host: String,

    /// SMTP server port. 465 selects implicit TLS, anything else STARTTLS.
    pub smtp_port: u16,

    /// Address used as `From`, envelope sender and login name.
    pub sender_address: String,

    /// Password for `sender_address`.
    pub sender_password: SmtpPassword,

    /// The review platform's address. Every invitation is delivered here and
    /// nowhere else.
    pub destination_address: String,
}

/// Outcome of a successful send.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Delivery {
    /// `Message-ID` of the transmitted email.
    pub message_id: String,
}

/// Sends review invitations to the configured destination.
///
/// Each send opens its own session and closes it before returning.
#[derive(Clone, Debug)]
pub struct NotificationSender<C = SmtpConnector> {
    config: SenderConfig,
    connector: C,
}

impl NotificationSender<SmtpConnector> {
    /// Creates a sender using lettre's SMTP client. Nothing is validated or
    /// connected here.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use review_invite_notification::{NotificationSender, SenderConfig, SmtpPassword};
    ///
    /// let sender = NotificationSender::new(SenderConfig {
    ///     smtp_host: "smtp.gmail.com".to_string(),
    ///     smtp_port: 587,
    ///     sender_address: "noreply@example.com".to_string(),
    ///     sender_password: SmtpPassword::new("app-password"),
    ///     destination_address: "example.com+123456@invite.trustpilot.com".to_string(),
    /// });
    ///
    /// sender.send_invitation("customer@example.com", "John Doe", "ORDER-1001");
    /// ```
    #[must_use]
    pub fn new(config: SenderConfig) -> Self { Self::with_connector(config, SmtpConnector::default()) }
}

impl<C> NotificationSender<C> {
    /// Creates a sender that opens its sessions through `connector`.
    #[must_use]
    pub const fn with_connector(config: SenderConfig, connector: C) -> Self {
        Self { config, connector }
    }

    /// The configuration this sender was created with.
    #[must_use]
    pub const fn config(&self) -> &SenderConfig { &self.config }
}

impl<C: Connector> NotificationSender<C> {
    /// Composes and transmits one invitation.
    ///
    /// The session, once opened, is closed on every path; a failure while
    /// closing is logged and otherwise ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the message cannot be composed, the session cannot
    /// be opened, the login is refused or the server rejects the message.
    pub fn try_send_invitation(&self, request: &InvitationRequest) -> Result<Delivery, Error> {
        let SenderConfig {
            smtp_host,
            smtp_port,
            sender_address,
            sender_password,
            destination_address,
        } = &self.config;

        let email = build_invitation_email(sender_address, destination_address, request)?;

        let endpoint = Endpoint::new(smtp_host.as_str(), *smtp_port);
        let mut session = SessionGuard::new(self.connector.connect(&endpoint)?);

        session.authenticate(sender_address, sender_password)?;
        session.send(email.envelope(), &email.formatted())?;

        tracing::debug!(
            reference_id = %request.reference_id,
            recipient_email = %request.recipient_email,
            "Review invitation accepted by SMTP server"
        );

        Ok(Delivery { message_id: email.message_id().to_string() })
    }

    /// Fire-and-forget variant of [`Self::try_send_invitation`].
    ///
    /// The outcome is only reported through `tracing`; nothing is returned and
    /// no error escapes.
    pub fn send_invitation(&self, recipient_email: &str, recipient_name: &str, reference_id: &str) {
        let request = InvitationRequest::new(recipient_email, recipient_name, reference_id);

        match self.try_send_invitation(&request) {
            Ok(Delivery { message_id }) => tracing::info!(
                %message_id,
                reference_id,
                destination = %self.config.destination_address,
                "Review invitation sent"
            ),
            Err(error) => tracing::error!(
                kind = %error.kind(),
                %error,
                reference_id,
                "Failed to send review invitation"
            ),
        }
    }
}

impl<C: Connector> NotificationClient for NotificationSender<C> {
    fn send_notification(&self, notification: &Notification) -> Result<Delivery, Error> {
        let Notification::ReviewInvitation(request) = notification;
        self.try_send_invitation(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SenderConfig {
        SenderConfig {
            smtp_host: "smtp.test".to_string(),
            smtp_port: 587,
            sender_address: "a@x.com".to_string(),
            sender_password: SmtpPassword::new("secret"),
            destination_address: "dest+1@invite.test".to_string(),
        }
    }

    #[test]
    fn test_new_stores_config_verbatim() {
        let config = SenderConfig { sender_address: "not-an-address".to_string(), ..config() };
        let sender = NotificationSender::new(config.clone());

        assert_eq!(sender.config(), &config);
    }

    #[test]
    fn test_config_debug_hides_password() {
        let debug = format!("{:?}", NotificationSender::new(config()));

        assert!(!debug.contains("secret"));
        assert!(debug.contains("dest+1@invite.test"));
    }

    #[test]
    fn test_sender_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<NotificationSender>();
    }
}
