use std::time::Duration;

use review_invite_notification::{SenderConfig, SmtpConnector, SmtpPassword};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SmtpConfig {
    /// SMTP server host name
    #[serde(default = "SmtpConfig::default_host")]
    pub host: String,

    /// SMTP server port, 465 for implicit TLS, anything else for STARTTLS
    #[serde(default = "SmtpConfig::default_port")]
    pub port: u16,

    /// Sender address, also used as login name
    #[serde(default = "SmtpConfig::default_sender_address")]
    pub sender_address: String,

    /// Password of the sender account
    #[serde(default)]
    pub sender_password: SmtpPassword,

    /// Unique invitation address provided by the review platform
    #[serde(default = "SmtpConfig::default_destination_address")]
    pub destination_address: String,

    /// Socket timeout in seconds, unset to wait indefinitely
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl SmtpConfig {
    #[inline]
    pub fn default_host() -> String { "127.0.0.1".to_string() }

    #[inline]
    pub const fn default_port() -> u16 { 587 }

    #[inline]
    pub fn default_sender_address() -> String { "noreply@example.com".to_string() }

    #[inline]
    pub fn default_destination_address() -> String {
        "example.com+123456@invite.trustpilot.com".to_string()
    }

    #[inline]
    pub fn connector(&self) -> SmtpConnector {
        SmtpConnector::new(self.timeout_secs.map(Duration::from_secs))
    }
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            sender_address: Self::default_sender_address(),
            sender_password: SmtpPassword::default(),
            destination_address: Self::default_destination_address(),
            timeout_secs: None,
        }
    }
}

impl From<SmtpConfig> for SenderConfig {
    fn from(
        SmtpConfig {
            host,
            port,
            sender_address,
            sender_password,
            destination_address,
            timeout_secs: _,
        }: SmtpConfig,
    ) -> Self {
        Self {
            smtp_host: host,
            smtp_port: port,
            sender_address,
            sender_password,
            destination_address,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_partial() {
        let config: SmtpConfig =
            serde_yaml::from_str("host: smtp.test\nport: 465\nsender_password: secret\n").unwrap();

        assert_eq!(config.host, "smtp.test");
        assert_eq!(config.port, 465);
        assert_eq!(config.sender_password.expose(), "secret");
        assert_eq!(config.sender_address, SmtpConfig::default_sender_address());
        assert_eq!(config.timeout_secs, None);
    }

    #[test]
    fn test_into_sender_config() {
        let sender: SenderConfig = SmtpConfig {
            host: "smtp.test".to_string(),
            port: 587,
            sender_address: "a@x.com".to_string(),
            sender_password: SmtpPassword::new("secret"),
            destination_address: "dest+1@invite.test".to_string(),
            timeout_secs: Some(30),
        }
        .into();

        assert_eq!(sender.smtp_host, "smtp.test");
        assert_eq!(sender.smtp_port, 587);
        assert_eq!(sender.sender_address, "a@x.com");
        assert_eq!(sender.sender_password.expose(), "secret");
        assert_eq!(sender.destination_address, "dest+1@invite.test");
    }
}
