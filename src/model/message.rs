use mail_parser::parsers::MessageStream;
use mail_parser::{HeaderValue, MessageParser};

use crate::model::action::Action;
use crate::model::address::{parse_address_list, MailAddress};
use crate::model::mail::MailAdapter;

/// An RFC 822 message held in memory, with the envelope supplied by the host.
///
/// The raw bytes are kept untouched: they are what gets delivered and what
/// `size` measures.
#[derive(Debug, Clone, Default)]
pub struct ParsedMessage {
    raw: Vec<u8>,
    /// Top-level header fields in message order.
    headers: Vec<HeaderField>,
    body_offset: usize,
    envelope_from: Option<String>,
    envelope_to: Option<String>,
    actions: Vec<Action>,
}

/// Name plus the byte range of the unparsed value.
#[derive(Debug, Clone)]
struct HeaderField {
    name: String,
    start: usize,
    end: usize,
}

impl ParsedMessage {
    /// Indexes the top-level headers. Never fails: input `mail_parser`
    /// cannot make sense of is treated as a message with no headers.
    pub fn parse(raw: impl Into<Vec<u8>>) -> Self {
        let raw = raw.into();
        let mut headers = Vec::new();
        let mut body_offset = 0;

        if let Some(root) = MessageParser::new()
            .parse(&raw)
            .and_then(|message| message.parts.into_iter().next())
        {
            for header in &root.headers {
                headers.push(HeaderField {
                    name: header.name().to_string(),
                    start: header.offset_start as usize,
                    end: header.offset_end as usize,
                });
            }
            body_offset = root.raw_body_offset() as usize;
        }

        Self {
            raw,
            headers,
            body_offset,
            ..Default::default()
        }
    }

    pub fn with_envelope(mut self, from: Option<String>, to: Option<String>) -> Self {
        self.envelope_from = from;
        self.envelope_to = to;
        self
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// First value of a header, decoded.
    pub fn first_header(&self, name: &str) -> Option<String> {
        self.header(name).into_iter().next()
    }

    pub fn take_actions(&mut self) -> Vec<Action> {
        std::mem::take(&mut self.actions)
    }

    fn values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a [u8]> + 'a {
        self.headers
            .iter()
            .filter(move |field| field.name.eq_ignore_ascii_case(name))
            .map(move |field| self.raw.get(field.start..field.end).unwrap_or_default())
    }
}

impl MailAdapter for ParsedMessage {
    fn header(&self, name: &str) -> Vec<String> {
        self.values(name)
            .map(|bytes| match MessageStream::new(bytes).parse_unstructured() {
                HeaderValue::Text(text) => text.trim().to_string(),
                _ => String::new(),
            })
            .collect()
    }

    fn addresses(&self, name: &str) -> Vec<MailAddress> {
        self.values(name).flat_map(parse_address_list).collect()
    }

    fn header_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for field in &self.headers {
            if !names.iter().any(|n| n.eq_ignore_ascii_case(&field.name)) {
                names.push(field.name.clone());
            }
        }
        names
    }

    fn envelope_from(&self) -> Option<String> {
        self.envelope_from.clone()
    }

    fn envelope_to(&self) -> Option<String> {
        self.envelope_to.clone()
    }

    fn size(&self) -> u64 {
        self.raw.len() as u64
    }

    fn body(&self) -> &[u8] {
        self.raw.get(self.body_offset..).unwrap_or_default()
    }

    fn add_action(&mut self, action: Action) {
        self.actions.push(action);
    }

    fn actions(&self) -> &[Action] {
        &self.actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MESSAGE: &str = "From: Brennan <brennan@umanwizard.com>\r\n\
Subject: =?utf-8?Q?caf=C3=A9?=\r\n\
X-Caffeine: C8H10N4O2\r\n\
Received: from a\r\n\
 by b\r\n\
X-Caffeine: decaf\r\n\
\r\n\
Body line\r\n";

    #[test]
    fn test_headers_are_case_insensitive_and_ordered() {
        let message = ParsedMessage::parse(MESSAGE);
        assert_eq!(message.header("x-caffeine"), vec!["C8H10N4O2", "decaf"]);
        assert!(message.header("Missing").is_empty());
        assert_eq!(message.header_names().len(), 4);
    }

    #[test]
    fn test_decoding_body_and_size() {
        let message = ParsedMessage::parse(MESSAGE);
        assert_eq!(message.first_header("subject").as_deref(), Some("café"));
        assert_eq!(message.body(), b"Body line\r\n");
        assert_eq!(message.size(), MESSAGE.len() as u64);
    }

    #[test]
    fn test_eight_bit_bytes_are_kept() {
        let raw = b"Subject: caf\xe9\r\n\r\nd\xe9j\xe0 vu\r\n".to_vec();
        let message = ParsedMessage::parse(raw.clone());
        assert_eq!(message.size(), raw.len() as u64);
        assert_eq!(message.raw(), raw.as_slice());
        assert_eq!(message.body(), b"d\xe9j\xe0 vu\r\n");
    }

    #[test]
    fn test_addresses_ignore_encoded_display_names() {
        let message = ParsedMessage::parse(
            "From: =?utf-8?Q?Doe=2C_John?= <john@example.com>\r\n\r\nhi\r\n",
        );
        let from: Vec<String> = message.addresses("from").iter().map(|a| a.address()).collect();
        assert_eq!(from, vec!["john@example.com"]);
        assert!(message.header("from")[0].starts_with("Doe, John"));
        assert!(message.addresses("cc").is_empty());
    }

    #[test]
    fn test_empty_message() {
        let empty = ParsedMessage::parse("");
        assert!(empty.header_names().is_empty());
        assert_eq!(empty.size(), 0);
        assert!(empty.body().is_empty());
    }

    #[test]
    fn test_actions_append() {
        let mut message = ParsedMessage::parse(MESSAGE);
        message.add_action(Action::Keep);
        assert_eq!(message.actions(), &[Action::Keep]);
        assert_eq!(message.take_actions().len(), 1);
        assert!(message.actions().is_empty());
    }
}
