//! Standalone mail utility: delivery notes with optional attachments over
//! authenticated SMTP submission. Not part of the export pipeline.

use std::path::PathBuf;

use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials as SmtpCredentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

use crate::error::{EkosError, Result};

pub const DEFAULT_RELAY: &str = "smtp.gmail.com";
pub const DEFAULT_PORT: u16 = 587;

/// One outgoing message: body, subject, recipients, sender, and any
/// attachment paths.
#[derive(Debug, Clone)]
pub struct OutgoingMail {
    pub subject: String,
    pub body: String,
    pub to: Vec<String>,
    pub from: String,
    pub reply_to: Option<String>,
    pub attachments: Vec<PathBuf>,
}

/// Sends mail through a submission endpoint over STARTTLS, logging in with
/// the sender's credentials.
#[derive(Debug, Clone)]
pub struct Mailer {
    relay: String,
    port: u16,
}

impl Default for Mailer {
    fn default() -> Self {
        Self {
            relay: DEFAULT_RELAY.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl Mailer {
    pub fn new(relay: impl Into<String>, port: u16) -> Self {
        Self { relay: relay.into(), port }
    }

    pub async fn send(&self, mail: &OutgoingMail, password: &str) -> Result<()> {
        let message = build_message(mail)?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.relay)
            .map_err(|e| EkosError::Mail(e.to_string()))?
            .port(self.port)
            .credentials(SmtpCredentials::new(mail.from.clone(), password.to_string()))
            .build();

        transport
            .send(message)
            .await
            .map_err(|e| EkosError::Mail(e.to_string()))?;

        info!(target = "ekos", to = ?mail.to, subject = %mail.subject, "mail sent");
        Ok(())
    }
}

fn mailbox(address: &str) -> Result<Mailbox> {
    address
        .parse()
        .map_err(|e| EkosError::Mail(format!("invalid address {address:?}: {e}")))
}

fn build_message(mail: &OutgoingMail) -> Result<Message> {
    let mut builder = Message::builder()
        .from(mailbox(&mail.from)?)
        .subject(mail.subject.clone());

    if mail.to.is_empty() {
        return Err(EkosError::Mail("no recipients".to_string()));
    }
    for to in &mail.to {
        builder = builder.to(mailbox(to)?);
    }
    if let Some(reply_to) = &mail.reply_to {
        builder = builder.reply_to(mailbox(reply_to)?);
    }

    let mut multipart = MultiPart::mixed().singlepart(SinglePart::plain(mail.body.clone()));
    for path in &mail.attachments {
        let bytes = std::fs::read(path)?;
        let mime = mime_guess::from_path(path).first_or_octet_stream();
        let content_type = ContentType::parse(mime.as_ref())
            .map_err(|e| EkosError::Mail(format!("unusable content type {mime}: {e}")))?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "attachment".to_string());
        multipart = multipart.singlepart(Attachment::new(filename).body(bytes, content_type));
    }

    builder
        .multipart(multipart)
        .map_err(|e| EkosError::Mail(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mail() -> OutgoingMail {
        OutgoingMail {
            subject: "Deliveries updated".to_string(),
            body: "This week's distro sheet is up.".to_string(),
            to: vec!["sales@example.com".to_string()],
            from: "deliveries@example.com".to_string(),
            reply_to: None,
            attachments: Vec::new(),
        }
    }

    fn rendered(mail: &OutgoingMail) -> String {
        let message = build_message(mail).unwrap();
        String::from_utf8_lossy(&message.formatted()).into_owned()
    }

    #[test]
    fn message_carries_body_and_subject() {
        let out = rendered(&mail());
        assert!(out.contains("Subject: Deliveries updated"));
        assert!(out.contains("This week's distro sheet is up."));
    }

    #[test]
    fn csv_attachment_gets_text_csv_content_type() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("Distro - This Week.csv");
        std::fs::write(&path, "a,b\n1,2\n").unwrap();

        let mut m = mail();
        m.attachments.push(path);
        let out = rendered(&m);
        assert!(out.contains("text/csv"));
        assert!(out.contains("Distro - This Week.csv"));
    }

    #[test]
    fn unknown_extension_falls_back_to_octet_stream() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("payload.zzqq");
        std::fs::write(&path, [0u8, 1, 2]).unwrap();

        let mut m = mail();
        m.attachments.push(path);
        let out = rendered(&m);
        assert!(out.contains("application/octet-stream"));
    }

    #[test]
    fn multiple_recipients_are_all_addressed() {
        let mut m = mail();
        m.to.push("warehouse@example.com".to_string());
        let out = rendered(&m);
        assert!(out.contains("sales@example.com"));
        assert!(out.contains("warehouse@example.com"));
    }

    #[test]
    fn reply_to_is_included_when_set() {
        let mut m = mail();
        m.reply_to = Some("noreply@example.com".to_string());
        let out = rendered(&m);
        assert!(out.contains("Reply-To: noreply@example.com"));
    }

    #[test]
    fn empty_recipient_list_is_rejected() {
        let mut m = mail();
        m.to.clear();
        assert!(matches!(build_message(&m), Err(EkosError::Mail(_))));
    }

    #[test]
    fn bad_address_is_rejected() {
        let mut m = mail();
        m.to = vec!["not an address".to_string()];
        assert!(matches!(build_message(&m), Err(EkosError::Mail(_))));
    }
}
