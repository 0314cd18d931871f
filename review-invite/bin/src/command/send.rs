use std::{
    io::{self, Write},
    process,
};

use review_invite_notification::{
    InvitationRequest, Notification, NotificationClient, NotificationSender, SenderConfig,
    SmtpPassword,
};
use snafu::ResultExt;

use crate::{
    cli::SendArgs,
    config::Config,
    error::{self, Result},
    project::PROGRAM_NAME,
    shadow::{BRANCH, PKG_VERSION, SHORT_COMMIT},
};

/// Send one review invitation
pub fn run_send(config: Config, args: &SendArgs) -> Result<()> {
    let Config { log, mut smtp } = config;

    log.init().context(error::InitializeLoggerSnafu)?;

    tracing::info!(
        "{PROGRAM_NAME} {PKG_VERSION} ({BRANCH}@{SHORT_COMMIT}) is starting, pid: {}",
        process::id()
    );

    if let Some(password) = &args.smtp_password {
        tracing::debug!("Using SMTP password from the command line or environment");
        smtp.sender_password = SmtpPassword::new(password.as_str());
    }

    let connector = smtp.connector();
    let sender_config = SenderConfig::from(smtp);
    tracing::info!(
        host = %sender_config.smtp_host,
        port = sender_config.smtp_port,
        destination = %sender_config.destination_address,
        "Sending review invitation"
    );
    let sender = NotificationSender::with_connector(sender_config, connector);

    let notification = Notification::ReviewInvitation(InvitationRequest::new(
        args.recipient_email.as_str(),
        args.recipient_name.as_str(),
        args.reference_id.as_str(),
    ));

    let delivery = match sender.send_notification(&notification) {
        Ok(delivery) => delivery,
        Err(err) => {
            tracing::error!(kind = %err.kind(), error = %err, "Failed to send review invitation");
            return Err(err.into());
        }
    };

    tracing::info!(message_id = %delivery.message_id, "Review invitation sent");
    writeln!(io::stdout(), "{}", delivery.message_id).context(error::WriteStdoutSnafu)
}
