use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "ekos")]
#[command(about = "Ekos report export and spreadsheet delivery automation")]
#[command(version)]
pub struct Cli {
    /// Increase verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Settings file for the delivery run
    #[arg(short, long, global = true, value_name = "FILE", default_value = "deliveries.yaml")]
    pub config: PathBuf,

    /// Append-only log file
    #[arg(long, global = true, value_name = "FILE", default_value = "deliveries.log")]
    pub log_file: PathBuf,

    /// Run the browser without a visible window
    #[arg(long, global = true)]
    pub headless: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch the report from Ekos and publish it to the spreadsheet
    Run {
        /// Report display name (overrides the configured one)
        #[arg(long)]
        report: Option<String>,
    },

    /// Fetch the report CSV without publishing; prints the resolved path
    Fetch {
        /// Report display name (overrides the configured one)
        #[arg(long)]
        report: Option<String>,
    },

    /// Publish an already-downloaded CSV to the spreadsheet
    Publish {
        /// CSV file to import
        csv: PathBuf,

        /// Data range in A1 notation (overrides the configured one)
        #[arg(long)]
        range: Option<String>,

        /// Skip clearing the range before writing
        #[arg(long)]
        no_clear: bool,
    },

    /// Send a notification email with optional attachments
    SendMail(SendMailArgs),
}

#[derive(Args, Debug)]
pub struct SendMailArgs {
    /// Message body
    #[arg(long)]
    pub message: String,

    /// Subject line
    #[arg(long)]
    pub subject: String,

    /// Recipient address (repeat for multiple)
    #[arg(long = "to", value_name = "ADDRESS", required = true)]
    pub to: Vec<String>,

    /// Sender address, also used to log in to the relay
    #[arg(long)]
    pub from: String,

    /// Password for the sender account
    #[arg(long, env = "EKOS_SMTP_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Reply-To address
    #[arg(long)]
    pub reply_to: Option<String>,

    /// Attachment path (repeat for multiple)
    #[arg(long = "attach", value_name = "FILE")]
    pub attachments: Vec<PathBuf>,

    /// SMTP relay host
    #[arg(long, default_value = ekos::email::DEFAULT_RELAY)]
    pub relay: String,

    /// SMTP submission port
    #[arg(long, default_value_t = ekos::email::DEFAULT_PORT)]
    pub port: u16,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn send_mail_accepts_repeated_recipients_and_attachments() {
        let cli = Cli::parse_from([
            "ekos",
            "send-mail",
            "--message",
            "sheet updated",
            "--subject",
            "Deliveries",
            "--to",
            "a@example.com",
            "--to",
            "b@example.com",
            "--from",
            "ops@example.com",
            "--password",
            "pw",
            "--attach",
            "Distro - This Week.csv",
        ]);
        match cli.command {
            Commands::SendMail(args) => {
                assert_eq!(args.to.len(), 2);
                assert_eq!(args.attachments.len(), 1);
                assert_eq!(args.relay, ekos::email::DEFAULT_RELAY);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
