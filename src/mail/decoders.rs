use mailparse::MailAddr;

/// Decode RFC 2047 encoded-words in a header value. Plain values pass through.
pub fn decode_mime_words(raw: &str) -> String {
    // mailparse expects a full "Key: value" header line
    let mut line = b"X: ".to_vec();
    line.extend_from_slice(raw.as_bytes());
    line.extend_from_slice(b"\r\n");

    match mailparse::parse_header(&line) {
        Ok((h, _idx)) => h.get_value(),
        Err(_) => raw.to_string(),
    }
}

/// A single address as found in From / Reply-To.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mailbox {
    pub name: Option<String>,
    pub email: String,
}

impl std::fmt::Display for Mailbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name} <{}>", self.email),
            None => f.write_str(&self.email),
        }
    }
}

impl Mailbox {
    pub fn bare(email: impl Into<String>) -> Self {
        Self {
            name: None,
            email: email.into(),
        }
    }
}

/// First mailbox of an address header, looking inside groups.
pub fn first_mailbox(raw: &str) -> Option<Mailbox> {
    let addrs = mailparse::addrparse(raw).ok()?;
    let single = addrs.iter().find_map(|a| match a {
        MailAddr::Single(info) => Some(info.clone()),
        MailAddr::Group(group) => group.addrs.first().cloned(),
    })?;

    if !single.addr.contains('@') {
        return None;
    }
    Some(Mailbox {
        name: single
            .display_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty()),
        email: single.addr,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoded_words_are_decoded() {
        assert_eq!(
            decode_mime_words("=?UTF-8?Q?Trial_expired_by_Jos=C3=A9?="),
            "Trial expired by José"
        );
        assert_eq!(decode_mime_words("plain subject"), "plain subject");
    }

    #[test]
    fn mailbox_with_display_name() {
        assert_eq!(
            first_mailbox("\"Smith, John\" <jsmith@example.com>"),
            Some(Mailbox {
                name: Some("Smith, John".into()),
                email: "jsmith@example.com".into()
            })
        );
    }

    #[test]
    fn bare_address_and_lists() {
        assert_eq!(
            first_mailbox("jsmith@example.com"),
            Some(Mailbox::bare("jsmith@example.com"))
        );
        assert_eq!(
            first_mailbox("a@example.com, b@example.com"),
            Some(Mailbox::bare("a@example.com"))
        );
    }

    #[test]
    fn garbage_is_not_a_mailbox() {
        assert_eq!(first_mailbox("undisclosed-recipients"), None);
        assert_eq!(first_mailbox(""), None);
    }

    #[test]
    fn display_round_trips_through_the_parser() {
        let m = Mailbox {
            name: Some("Jane".into()),
            email: "jane@example.com".into(),
        };
        assert_eq!(m.to_string(), "Jane <jane@example.com>");
        assert_eq!(first_mailbox(&m.to_string()), Some(m));
    }
}
