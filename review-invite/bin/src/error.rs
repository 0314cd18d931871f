use review_invite_notification::ErrorKind;
use snafu::Snafu;

use crate::config;

/// Result type alias for the CLI.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error type for the CLI.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("{source}"))]
    Notification { source: review_invite_notification::Error },

    #[snafu(display("{source}"))]
    Config { source: config::Error },

    #[snafu(display("Could not initialize logger, error: {source}"))]
    InitializeLogger { source: tracing_subscriber::util::TryInitError },

    #[snafu(display("Could not write to stdout, error: {source}"))]
    WriteStdout { source: std::io::Error },
}

impl From<config::Error> for Error {
    fn from(source: config::Error) -> Self { Self::Config { source } }
}

impl From<review_invite_notification::Error> for Error {
    fn from(source: review_invite_notification::Error) -> Self { Self::Notification { source } }
}

pub trait CommandError {
    fn exit_code(&self) -> exitcode::ExitCode;
}

impl CommandError for Error {
    fn exit_code(&self) -> exitcode::ExitCode {
        match self {
            Self::Notification { source } => match source.kind() {
                ErrorKind::Compose => exitcode::DATAERR,
                ErrorKind::Connect | ErrorKind::Transmit | ErrorKind::Close => {
                    exitcode::UNAVAILABLE
                }
                ErrorKind::Authenticate => exitcode::NOPERM,
            },
            Self::Config { .. } => exitcode::CONFIG,
            Self::InitializeLogger { .. } => exitcode::SOFTWARE,
            Self::WriteStdout { .. } => exitcode::IOERR,
        }
    }
}
