use anyhow::{Context, Result};
use base64::{Engine as _, engine::general_purpose};
use mail_builder::MessageBuilder;
use mail_builder::headers::address::Address;

use crate::config::RunConfig;
use crate::gmail::types::OutgoingMessage;
use crate::mail::decoders::Mailbox;
use crate::pipeline::extract::Eligible;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyDraft {
    pub to: Mailbox,
    pub subject: String,
    pub body: String,
    pub thread_id: String,
    /// Original Message-ID, used for both In-Reply-To and References.
    pub in_reply_to: String,
}

pub fn render_body(template: &str, username: &str) -> String {
    template.replace("{username}", username)
}

impl ReplyDraft {
    /// Reply to `candidate`, redirected to the test recipient in test mode.
    pub fn new(candidate: &Eligible, cfg: &RunConfig) -> Self {
        let to = if cfg.test_mode {
            Mailbox::bare(cfg.test_recipient.trim())
        } else {
            candidate.reply_to.clone()
        };

        Self {
            to,
            subject: format!("Re: {}", candidate.subject),
            body: render_body(&cfg.template, &candidate.username),
            thread_id: candidate.thread_id.clone(),
            in_reply_to: candidate.message_id.clone(),
        }
    }

    /// RFC 5322 bytes of the reply.
    pub fn to_mime(&self) -> Result<Vec<u8>> {
        // mail-builder adds the angle brackets itself
        let msg_id = self
            .in_reply_to
            .trim()
            .trim_start_matches('<')
            .trim_end_matches('>')
            .to_string();

        MessageBuilder::new()
            .to(Address::new_address(
                self.to.name.clone(),
                self.to.email.clone(),
            ))
            .subject(self.subject.clone())
            .in_reply_to(msg_id.clone())
            .references(msg_id)
            .text_body(self.body.clone())
            .write_to_vec()
            .context("building reply MIME message")
    }

    /// The send request: base64url of the MIME bytes plus the thread to join.
    pub fn encode(&self) -> Result<OutgoingMessage> {
        Ok(OutgoingMessage {
            raw: general_purpose::URL_SAFE.encode(self.to_mime()?),
            thread_id: self.thread_id.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mailparse::MailHeaderMap;

    fn candidate() -> Eligible {
        Eligible {
            id: "m1".into(),
            thread_id: "t1".into(),
            message_id: "<abc@mail>".into(),
            subject: "Trial expired by jsmith".into(),
            username: "jsmith".into(),
            reply_to: Mailbox::bare("jsmith@example.com"),
        }
    }

    #[test]
    fn draft_fills_template_and_subject() {
        let draft = ReplyDraft::new(&candidate(), &RunConfig::default());

        assert_eq!(draft.to, Mailbox::bare("jsmith@example.com"));
        assert_eq!(draft.subject, "Re: Trial expired by jsmith");
        assert!(draft.body.starts_with("Hi jsmith,\n"));
        assert!(!draft.body.contains("{username}"));
        assert_eq!(draft.thread_id, "t1");
        assert_eq!(draft.in_reply_to, "<abc@mail>");
    }

    #[test]
    fn test_mode_redirects_recipient_only() {
        let cfg = RunConfig {
            test_mode: true,
            test_recipient: "qa@example.com".into(),
            ..RunConfig::default()
        };
        let draft = ReplyDraft::new(&candidate(), &cfg);

        assert_eq!(draft.to, Mailbox::bare("qa@example.com"));
        assert!(draft.body.starts_with("Hi jsmith,"));
        assert_eq!(draft.thread_id, "t1");
    }

    #[test]
    fn encoded_reply_is_threaded_mime() {
        let out = ReplyDraft::new(&candidate(), &RunConfig::default())
            .encode()
            .unwrap();
        assert_eq!(out.thread_id, "t1");

        let raw = general_purpose::URL_SAFE.decode(&out.raw).unwrap();
        let parsed = mailparse::parse_mail(&raw).unwrap();

        assert_eq!(
            parsed.headers.get_first_value("Subject").as_deref(),
            Some("Re: Trial expired by jsmith")
        );
        assert!(
            parsed
                .headers
                .get_first_value("To")
                .unwrap()
                .contains("jsmith@example.com")
        );
        assert_eq!(
            parsed.headers.get_first_value("In-Reply-To").as_deref(),
            Some("<abc@mail>")
        );
        assert_eq!(
            parsed.headers.get_first_value("References").as_deref(),
            Some("<abc@mail>")
        );
        assert!(parsed.get_body().unwrap().contains("Hi jsmith,"));
    }

    #[test]
    fn display_name_and_non_ascii_survive_encoding() {
        let mut c = candidate();
        c.username = "José".into();
        c.subject = "Trial expired by José".into();
        c.reply_to = Mailbox {
            name: Some("José Pérez".into()),
            email: "jose@example.com".into(),
        };

        let raw = general_purpose::URL_SAFE
            .decode(ReplyDraft::new(&c, &RunConfig::default()).encode().unwrap().raw)
            .unwrap();
        let parsed = mailparse::parse_mail(&raw).unwrap();

        assert_eq!(
            parsed.headers.get_first_value("Subject").as_deref(),
            Some("Re: Trial expired by José")
        );
        let to = parsed.headers.get_first_value("To").unwrap();
        assert!(to.contains("jose@example.com"), "{to}");
        assert!(parsed.get_body().unwrap().contains("Hi José,"));
    }
}
