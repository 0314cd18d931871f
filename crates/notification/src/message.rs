use lettre::{
    address::Envelope,
    message::{header::ContentType, Mailbox, MultiPart, SinglePart},
    Address, Message,
};
use snafu::ResultExt;
use uuid::Uuid;

use crate::{error, Error, InvitationRequest};

/// A composed invitation, ready to be handed to a session.
#[derive(Clone, Debug)]
pub struct InvitationEmail {
    message: Message,
    envelope: Envelope,
    message_id: String,
    payload: String,
}

impl InvitationEmail {
    /// The MIME message.
    #[must_use]
    pub const fn message(&self) -> &Message { &self.message }

    /// SMTP envelope. Its only recipient is the destination address.
    #[must_use]
    pub const fn envelope(&self) -> &Envelope { &self.envelope }

    /// Value of the `Message-ID` header.
    #[must_use]
    pub fn message_id(&self) -> &str { &self.message_id }

    /// The JSON document embedded in the HTML body.
    #[must_use]
    pub fn payload(&self) -> &str { &self.payload }

    /// The message as it goes over the wire.
    #[must_use]
    pub fn formatted(&self) -> Vec<u8> { self.message.formatted() }
}

/// Builds the invitation email for `request`.
///
/// The message is addressed to `destination` only; the customer's address is
/// carried inside the payload.
///
/// # Errors
///
/// Returns an error if `from` or `destination` is not a valid address, or the
/// message cannot be built.
pub fn build_invitation_email(
    from: &str,
    destination: &str,
    request: &InvitationRequest,
) -> Result<InvitationEmail, Error> {
    let from = parse_address(from)?;
    let destination = parse_address(destination)?;

    let payload = request.to_payload_json()?;
    let html = request.to_html(&payload);
    let message_id = format!("<{}@{}>", Uuid::new_v4(), from.domain());

    let message = Message::builder()
        .from(Mailbox::new(None, from.clone()))
        .to(Mailbox::new(None, destination.clone()))
        .subject(request.subject())
        .message_id(Some(message_id.clone()))
        .multipart(
            MultiPart::alternative()
                .singlepart(SinglePart::builder().header(ContentType::TEXT_HTML).body(html)),
        )
        .context(error::BuildEmailSnafu)?;

    let envelope = Envelope::new(Some(from), vec![destination]).context(error::BuildEmailSnafu)?;

    Ok(InvitationEmail { message, envelope, message_id, payload })
}

fn parse_address(address: &str) -> Result<Address, Error> {
    address.parse().context(error::ParseAddressSnafu { address })
}
