use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroizing;

/// Password used to authenticate against the SMTP server.
///
/// `Debug` never prints the value and the buffer is wiped on drop.
#[derive(Clone, Default, Eq, PartialEq)]
pub struct SmtpPassword(Zeroizing<String>);

impl SmtpPassword {
    /// Wraps a plaintext password.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self { Self(Zeroizing::new(value.into())) }

    /// Returns the plaintext value. Only the SMTP login should call this.
    #[must_use]
    pub fn expose(&self) -> &str { self.0.as_str() }
}

impl fmt::Debug for SmtpPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SmtpPassword").field(&"[REDACTED]").finish()
    }
}

impl From<String> for SmtpPassword {
    fn from(value: String) -> Self { Self::new(value) }
}

impl Serialize for SmtpPassword {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.expose())
    }
}

impl<'de> Deserialize<'de> for SmtpPassword {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(Self::new)
    }
}
