use std::fmt;

use snafu::Snafu;

/// Boxed transport failure, as reported by a [`Session`](crate::Session) or
/// [`Connector`](crate::Connector).
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur in the notification crate.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// Failed to serialize the review invitation payload.
    #[snafu(display("Failed to serialize review invitation payload, error: {source}"))]
    SerializePayload {
        /// The underlying serde error.
        source: serde_json::Error,
    },

    /// A sender or destination address could not be parsed.
    #[snafu(display("Invalid email address `{address}`, error: {source}"))]
    ParseAddress {
        /// The rejected address.
        address: String,
        /// The underlying parse error.
        source: lettre::address::AddressError,
    },

    /// Failed to build the MIME message or its envelope.
    #[snafu(display("Failed to build email message, error: {source}"))]
    BuildEmail {
        /// The underlying lettre error.
        source: lettre::error::Error,
    },

    /// TLS parameters for the SMTP host could not be created.
    #[snafu(display("Failed to prepare TLS parameters for {host}, error: {source}"))]
    TlsParameters {
        /// SMTP host name.
        host: String,
        /// The underlying TLS error.
        source: BoxedError,
    },

    /// Could not open a session to the SMTP server.
    #[snafu(display("Could not connect to SMTP server {host}:{port}, error: {source}"))]
    Connect {
        /// SMTP host name.
        host: String,
        /// SMTP port.
        port: u16,
        /// The underlying transport error.
        source: BoxedError,
    },

    /// The plaintext session could not be upgraded with STARTTLS.
    #[snafu(display("Failed to upgrade SMTP session with {host} via STARTTLS, error: {source}"))]
    StartTls {
        /// SMTP host name.
        host: String,
        /// The underlying transport error.
        source: BoxedError,
    },

    /// The server rejected the sender credentials.
    #[snafu(display("Failed to authenticate as {username}, error: {source}"))]
    Authenticate {
        /// The login name, never the password.
        username: String,
        /// The underlying transport error.
        source: BoxedError,
    },

    /// The message was not accepted by the server.
    #[snafu(display("Failed to send email to {destination}, error: {source}"))]
    Transmit {
        /// The envelope recipient.
        destination: String,
        /// The underlying transport error.
        source: BoxedError,
    },

    /// Closing the session failed.
    #[snafu(display("Failed to close SMTP session, error: {source}"))]
    Quit {
        /// The underlying transport error.
        source: BoxedError,
    },
}

/// Coarse classification of an [`Error`], for callers that only care about
/// which step failed.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ErrorKind {
    /// The message could not be put together.
    Compose,
    /// No usable session could be opened.
    Connect,
    /// Login was refused.
    Authenticate,
    /// The server refused or lost the message.
    Transmit,
    /// The session could not be closed cleanly.
    Close,
}

impl Error {
    /// Which step of the send produced this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::SerializePayload { .. } | Self::ParseAddress { .. } | Self::BuildEmail { .. } => {
                ErrorKind::Compose
            }
            Self::TlsParameters { .. } | Self::Connect { .. } | Self::StartTls { .. } => {
                ErrorKind::Connect
            }
            Self::Authenticate { .. } => ErrorKind::Authenticate,
            Self::Transmit { .. } => ErrorKind::Transmit,
            Self::Quit { .. } => ErrorKind::Close,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compose => write!(f, "compose"),
            Self::Connect => write!(f, "connect"),
            Self::Authenticate => write!(f, "authenticate"),
            Self::Transmit => write!(f, "transmit"),
            Self::Close => write!(f, "close"),
        }
    }
}
