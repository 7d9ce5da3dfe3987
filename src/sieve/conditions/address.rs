use crate::model::address::{parse_mailbox, MailAddress};
use crate::model::enums::{AddressPart, EnvelopePart};
use crate::model::mail::MailAdapter;
use crate::sieve::ast::Test;
use crate::sieve::comparator::Comparator;
use crate::sieve::conditions::{MatchArguments, TestOp};
use crate::sieve::context::EvalContext;
use crate::sieve::error::{Result, SieveError};

pub fn address_test() -> Box<dyn TestOp> {
    Box::new(Address)
}

pub fn envelope_test() -> Box<dyn TestOp> {
    Box::new(Envelope)
}

/// Compares one address part against the keys. Domains are always compared
/// case-insensitively, whatever the comparator.
fn address_matches(
    address: &MailAddress,
    args: &MatchArguments,
    comparator: &dyn Comparator,
) -> bool {
    let value = address.part(args.address_part);
    if args.address_part == AddressPart::Domain {
        let value = value.to_ascii_lowercase();
        args.keys
            .iter()
            .any(|key| comparator.compare(args.match_type, &value, &key.to_ascii_lowercase()))
    } else {
        args.keys
            .iter()
            .any(|key| comparator.compare(args.match_type, &value, key))
    }
}

/// `address [:comparator] [address-part] [match-type] <header-list> <keys>`
struct Address;

impl TestOp for Address {
    fn validate_arguments(&self, test: &Test) -> Result<()> {
        MatchArguments::parse(test, true).map(|_| ())
    }

    fn call(&self, test: &Test, mail: &dyn MailAdapter, ctx: &mut EvalContext) -> Result<bool> {
        let args = MatchArguments::parse(test, true)?;
        let comparator = ctx.comparator(&args.comparator)?;

        for name in &args.names {
            if mail
                .addresses(name)
                .iter()
                .any(|address| address_matches(address, &args, comparator.as_ref()))
            {
                return Ok(true);
            }
        }

        Ok(false)
    }
}

/// `envelope [:comparator] [address-part] [match-type] <envelope-part> <keys>`
struct Envelope;

impl Envelope {
    fn parts(test: &Test, args: &MatchArguments) -> Result<Vec<EnvelopePart>> {
        args.names
            .iter()
            .map(|name| {
                EnvelopePart::from_sieve(name).ok_or_else(|| {
                    SieveError::syntax(
                        &test.name,
                        test.line,
                        format!("Unknown envelope part \"{name}\""),
                    )
                })
            })
            .collect()
    }
}

impl TestOp for Envelope {
    fn validate_arguments(&self, test: &Test) -> Result<()> {
        let args = MatchArguments::parse(test, true)?;
        Self::parts(test, &args).map(|_| ())
    }

    fn call(&self, test: &Test, mail: &dyn MailAdapter, ctx: &mut EvalContext) -> Result<bool> {
        let args = MatchArguments::parse(test, true)?;
        let comparator = ctx.comparator(&args.comparator)?;

        for part in Self::parts(test, &args)? {
            let value = match part {
                EnvelopePart::From => mail.envelope_from(),
                EnvelopePart::To => mail.envelope_to(),
            };
            let Some(value) = value else {
                continue;
            };
            let address = match value.trim() {
                "" | "<>" => MailAddress::null(),
                trimmed => parse_mailbox(trimmed).map_err(|message| SieveError::AddressParse {
                    header: format!("envelope {part}"),
                    message,
                })?,
            };
            if address_matches(&address, &args, comparator.as_ref()) {
                return Ok(true);
            }
        }

        Ok(false)
    }
}
