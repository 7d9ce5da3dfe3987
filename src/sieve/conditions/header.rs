use crate::model::enums::MatchType;
use crate::model::mail::MailAdapter;
use crate::sieve::ast::Test;
use crate::sieve::conditions::{single_string_list, MatchArguments, TestOp};
use crate::sieve::context::EvalContext;
use crate::sieve::error::Result;

pub fn header_test() -> Box<dyn TestOp> {
    Box::new(Header)
}

pub fn exists_test() -> Box<dyn TestOp> {
    Box::new(Exists)
}

/// `header [:comparator] [match-type] <header-names> <keys>`
struct Header;

impl TestOp for Header {
    fn validate_arguments(&self, test: &Test) -> Result<()> {
        MatchArguments::parse(test, false).map(|_| ())
    }

    fn call(&self, test: &Test, mail: &dyn MailAdapter, ctx: &mut EvalContext) -> Result<bool> {
        let args = MatchArguments::parse(test, false)?;
        let comparator = ctx.comparator(&args.comparator)?;

        for name in &args.names {
            let mut values = mail.header(name);
            if values.is_empty() {
                // An absent header still contains the empty string
                if args.match_type != MatchType::Contains {
                    continue;
                }
                values.push(String::new());
            }
            for value in &values {
                if args
                    .keys
                    .iter()
                    .any(|key| comparator.compare(args.match_type, value, key))
                {
                    return Ok(true);
                }
            }
        }

        Ok(false)
    }
}

/// `exists <header-names>`: every named header is present.
struct Exists;

impl TestOp for Exists {
    fn validate_arguments(&self, test: &Test) -> Result<()> {
        single_string_list(test).map(|_| ())
    }

    fn call(&self, test: &Test, mail: &dyn MailAdapter, _ctx: &mut EvalContext) -> Result<bool> {
        let names = single_string_list(test)?;
        Ok(names.iter().all(|name| !mail.header(name).is_empty()))
    }
}
