//! Standalone notification mail, independent of the delivery run.

use anyhow::Result;
use ekos::email::{Mailer, OutgoingMail};

use crate::cli::SendMailArgs;

pub async fn execute(args: SendMailArgs) -> Result<()> {
    let mail = OutgoingMail {
        subject: args.subject,
        body: args.message,
        to: args.to,
        from: args.from,
        reply_to: args.reply_to,
        attachments: args.attachments,
    };

    let mailer = Mailer::new(args.relay, args.port);
    mailer.send(&mail, &args.password).await?;
    Ok(())
}
