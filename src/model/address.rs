//! Mailbox extraction for the `address` and `envelope` tests and `redirect`.
//!
//! Structure comes from `mail_parser` working on the raw header bytes, so
//! encoded display names are decoded only after the list has been split.

use mail_parser::parsers::MessageStream;
use mail_parser::{Addr, Address};

use crate::model::enums::AddressPart;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailAddress {
    pub local_part: String,
    pub domain: Option<String>,
}

impl MailAddress {
    /// The null reverse path `<>`.
    pub fn null() -> Self {
        Self {
            local_part: String::new(),
            domain: None,
        }
    }

    /// Splits an addr-spec at its last `@`, dropping any obsolete source
    /// route (`@relay1,@relay2:user@host`).
    pub fn from_addr_spec(spec: &str) -> Self {
        let spec = match spec.strip_prefix('@').and_then(|route| route.split_once(':')) {
            Some((_, mailbox)) => mailbox,
            None => spec,
        };
        match spec.rsplit_once('@') {
            Some((local_part, domain)) => Self {
                local_part: local_part.to_string(),
                domain: Some(domain.to_string()),
            },
            None => Self {
                local_part: spec.to_string(),
                domain: None,
            },
        }
    }

    pub fn address(&self) -> String {
        match &self.domain {
            Some(domain) => format!("{}@{}", self.local_part, domain),
            None => self.local_part.clone(),
        }
    }

    pub fn part(&self, part: AddressPart) -> String {
        match part {
            AddressPart::All => self.address(),
            AddressPart::Localpart => self.local_part.clone(),
            AddressPart::Domain => self.domain.clone().unwrap_or_default(),
        }
    }
}

/// Every mailbox in a raw address-list header value, groups flattened.
/// Entries without an address (bare phrases, empty groups) are skipped.
pub fn parse_address_list(raw: &[u8]) -> Vec<MailAddress> {
    MessageStream::new(raw)
        .parse_address()
        .into_address()
        .map(mailboxes)
        .unwrap_or_default()
}

/// Parses exactly one mailbox, as found in envelopes and `redirect`.
pub fn parse_mailbox(input: &str) -> Result<MailAddress, String> {
    let input = input.trim();
    if input.is_empty() {
        return Err("empty address".to_string());
    }

    let line = format!("{input}\r\n");
    let mut addresses = parse_address_list(line.as_bytes());
    let address = match addresses.len() {
        0 => return Err("no address found".to_string()),
        1 => addresses.remove(0),
        n => return Err(format!("expected a single address, found {n}")),
    };

    match &address.domain {
        _ if address.local_part.is_empty() => Err("missing local part".to_string()),
        Some(domain) if domain.is_empty() => Err("missing domain".to_string()),
        _ => Ok(address),
    }
}

fn mailboxes(address: Address<'_>) -> Vec<MailAddress> {
    address
        .into_list()
        .iter()
        .filter_map(Addr::address)
        .map(str::trim)
        .filter(|spec| !spec.is_empty())
        .map(MailAddress::from_addr_spec)
        .collect()
}
