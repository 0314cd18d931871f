//! Review invitation payload and the HTML body that carries it.

use std::io;

use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use snafu::ResultExt;

use crate::{error, Error};

/// MIME type of the `<script>` element the review platform looks for.
pub const PAYLOAD_CONTENT_TYPE: &str = "application/json+trustpilot";

/// Indentation of the embedded JSON document.
const PAYLOAD_INDENT: &[u8] = b" ";

/// One customer to invite. The fields are forwarded as-is, nothing is
/// validated.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitationRequest {
    /// Customer email address, only ever written into the payload.
    pub recipient_email: String,

    /// Customer display name.
    pub recipient_name: String,

    /// Order reference.
    pub reference_id: String,
}

impl InvitationRequest {
    /// Creates a request from the customer's details.
    #[must_use]
    pub fn new(
        recipient_email: impl Into<String>,
        recipient_name: impl Into<String>,
        reference_id: impl Into<String>,
    ) -> Self {
        Self {
            recipient_email: recipient_email.into(),
            recipient_name: recipient_name.into(),
            reference_id: reference_id.into(),
        }
    }

    /// Subject line of the invitation email.
    #[must_use]
    pub fn subject(&self) -> String { format!("Order {}", self.reference_id) }

    /// Renders the JSON payload embedded in the email.
    ///
    /// Keys keep their declaration order and are indented by one space.
    /// `<`, `>` and `&` are written as unicode escapes so the document can sit
    /// inside a `<script>` element; parsing it back yields the same request.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_payload_json(&self) -> Result<String, Error> {
        let mut buf = Vec::new();
        let mut serializer = serde_json::Serializer::with_formatter(
            &mut buf,
            PrettyFormatter::with_indent(PAYLOAD_INDENT),
        );
        self.serialize(&mut serializer).context(error::SerializePayloadSnafu)?;

        let json = String::from_utf8(buf)
            .map_err(|err| serde_json::Error::io(io::Error::new(io::ErrorKind::InvalidData, err)))
            .context(error::SerializePayloadSnafu)?;
        Ok(escape_script_text(&json))
    }

    /// Renders the HTML document sent to the review platform around a
    /// `payload` produced by [`Self::to_payload_json`].
    #[must_use]
    pub fn to_html(&self, payload: &str) -> String {
        format!(
            "<html>\n<head>\n<script type=\"{PAYLOAD_CONTENT_TYPE}\">\n{payload}\n</script>\n</head>\n\
             <body>\n<p>Triggering invitation for {name} ({reference}).</p>\n</body>\n</html>\n",
            name = escape_html(&self.recipient_name),
            reference = escape_html(&self.reference_id),
        )
    }
}

fn escape_script_text(json: &str) -> String {
    let mut escaped = String::with_capacity(json.len());
    for c in json.chars() {
        match c {
            '<' => escaped.push_str("\\u003c"),
            '>' => escaped.push_str("\\u003e"),
            '&' => escaped.push_str("\\u0026"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> InvitationRequest { InvitationRequest::new("cust@y.com", "John Doe", "ORD-1") }

    #[test]
    fn test_payload_layout() {
        let json = request().to_payload_json().unwrap();

        assert_eq!(
            json,
            "{\n \"recipientEmail\": \"cust@y.com\",\n \"recipientName\": \"John Doe\",\n \
             \"referenceId\": \"ORD-1\"\n}"
        );
    }

    #[test]
    fn test_payload_parses_back_to_request() {
        let request = InvitationRequest::new(
            "not an address",
            "Zoë </script><script>alert(1)</script> & \"co\"",
            "",
        );
        let json = request.to_payload_json().unwrap();

        assert!(!json.contains("</script>"));
        let parsed: InvitationRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, request);
    }

    #[test]
    fn test_subject() {
        assert_eq!(request().subject(), "Order ORD-1");
        assert_eq!(InvitationRequest::new("a@b.c", "A", "").subject(), "Order ");
    }

    #[test]
    fn test_html_embeds_payload() {
        let request = request();
        let payload = request.to_payload_json().unwrap();
        let html = request.to_html(&payload);

        assert!(html.contains(&format!(
            "<script type=\"application/json+trustpilot\">\n{payload}\n</script>"
        )));
        assert!(html.contains("<p>Triggering invitation for John Doe (ORD-1).</p>"));
    }

    #[test]
    fn test_html_escapes_prose() {
        let request = InvitationRequest::new("a@b.c", "<b>Tom & Jerry</b>", "R'1");
        let html = request.to_html(&request.to_payload_json().unwrap());

        assert!(html.contains("&lt;b&gt;Tom &amp; Jerry&lt;/b&gt; (R&#39;1)"));
        assert_eq!(html.matches("</script>").count(), 1);
    }
}
