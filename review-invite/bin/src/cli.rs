use std::{io, io::Write, path::PathBuf};

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use snafu::ResultExt;

use crate::{
    command::run_send,
    config::Config,
    error::{self, Result},
    shadow,
};

#[derive(Debug, Parser)]
#[command(author,
    version,
    long_version = shadow::CLAP_LONG_VERSION,
    about,
    long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[clap(
        long = "config",
        short = 'c',
        env = "REVIEW_INVITE_CONFIG_FILE_PATH",
        help = "Specify a configuration file"
    )]
    config_file_path: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    #[clap(about = "Print version information")]
    Version,

    #[clap(about = "Output shell completion code for the specified shell (bash, zsh, fish)")]
    Completion { shell: Shell },

    #[clap(about = "Output default configuration")]
    DefaultConfig,

    #[clap(about = "Ask the review platform to invite a customer")]
    #[command(visible_alias = "invite")]
    Send(SendArgs),
}

#[derive(Clone, Debug, Args)]
pub struct SendArgs {
    #[arg(long, help = "Email address of the customer to invite")]
    pub recipient_email: String,

    #[arg(long, help = "Name of the customer to invite")]
    pub recipient_name: String,

    #[arg(long, help = "Order reference, also used in the subject")]
    pub reference_id: String,

    #[arg(
        long,
        env = "REVIEW_INVITE_SMTP_PASSWORD",
        hide_env_values = true,
        help = "Override the SMTP password from the configuration file"
    )]
    pub smtp_password: Option<String>,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Command::Version => {
                io::stdout()
                    .write_all(Self::command().render_long_version().as_bytes())
                    .context(error::WriteStdoutSnafu)?;
            }
            Command::Completion { shell } => {
                let mut command = Self::command();
                let bin_name = command.get_name().to_string();
                clap_complete::generate(shell, &mut command, bin_name, &mut io::stdout());
            }
            Command::DefaultConfig => {
                let config_text =
                    serde_yaml::to_string(&Config::default()).expect("`Config` is serializable");
                io::stdout().write_all(config_text.as_bytes()).context(error::WriteStdoutSnafu)?;
            }
            Command::Send(ref args) => {
                let config = self.load_config()?;
                run_send(config, args)?;
            }
        }

        Ok(())
    }

    fn load_config(&self) -> Result<Config> {
        let config_file_path = &self.config_file_path.clone().unwrap_or_else(Config::default_path);
        Ok(Config::load(config_file_path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_consistent() { Cli::command().debug_assert(); }

    #[test]
    fn test_parse_send() {
        let cli = Cli::try_parse_from([
            "review-invite",
            "--config",
            "/tmp/review-invite.yaml",
            "invite",
            "--recipient-email",
            "cust@y.com",
            "--recipient-name",
            "John Doe",
            "--reference-id",
            "ORD-1",
        ])
        .unwrap();

        assert_eq!(cli.config_file_path, Some(PathBuf::from("/tmp/review-invite.yaml")));
        let Command::Send(args) = cli.command else {
            panic!("expected the send command");
        };
        assert_eq!(args.recipient_email, "cust@y.com");
        assert_eq!(args.recipient_name, "John Doe");
        assert_eq!(args.reference_id, "ORD-1");
    }

    #[test]
    fn test_send_requires_reference() {
        let result = Cli::try_parse_from([
            "review-invite",
            "send",
            "--recipient-email",
            "cust@y.com",
            "--recipient-name",
            "John Doe",
        ]);

        assert!(result.is_err());
    }
}
