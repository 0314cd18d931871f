//! # Review Invite Notification
//!
//! Sends review invitations to a review platform over SMTP. The platform
//! reads a JSON payload embedded in the HTML body and invites the customer
//! itself, so every email goes to one fixed destination address and never
//! to the customer.
//!
//! ## Features
//!
//! - JSON payload inside an `application/json+trustpilot` script element
//! - Implicit TLS on port 465, STARTTLS everywhere else
//! - Typed results, plus a fire-and-forget wrapper that only logs
//! - Pluggable transport through [`Connector`] and [`Session`]

mod error;
mod invitation;
mod message;
mod secret;
mod sender;
pub mod transport;

pub use self::{
    error::{BoxedError, Error, ErrorKind},
    invitation::{InvitationRequest, PAYLOAD_CONTENT_TYPE},
    message::{build_invitation_email, InvitationEmail},
    secret::SmtpPassword,
    sender::{Delivery, NotificationSender, SenderConfig},
    transport::{Connector, Endpoint, Session, SmtpConnector, TransportSecurity},
};

/// Represents different types of notifications that can be sent.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Notification {
    /// Ask the review platform to invite a customer.
    ReviewInvitation(InvitationRequest),
}

/// Trait for notification clients that can send notifications.
pub trait NotificationClient {
    /// Sends a notification.
    ///
    /// # Errors
    ///
    /// Returns an error if the notification fails to send.
    fn send_notification(&self, notification: &Notification) -> Result<Delivery, Error>;
}
