use crate::model::enums::SizeComparator;
use crate::model::mail::MailAdapter;
use crate::sieve::ast::{Argument, Test};
use crate::sieve::conditions::TestOp;
use crate::sieve::context::EvalContext;
use crate::sieve::error::{Result, SieveError};

pub fn size_test() -> Box<dyn TestOp> {
    Box::new(Size)
}

/// `size <":over" / ":under"> <limit: number>`
struct Size;

impl Size {
    fn parse(test: &Test) -> Result<(SizeComparator, u64)> {
        if test.arguments.tests.is_some() {
            return Err(SieveError::syntax(
                &test.name,
                test.line,
                "Test does not take nested tests",
            ));
        }
        match test.arguments.positional.as_slice() {
            [Argument::Tag(tag), Argument::Number(limit)] => SizeComparator::from_sieve(tag)
                .map(|comparator| (comparator, *limit))
                .ok_or_else(|| {
                    SieveError::syntax(&test.name, test.line, format!("Unknown tag {tag}"))
                }),
            _ => Err(SieveError::syntax(
                &test.name,
                test.line,
                "Expected :over or :under followed by a number",
            )),
        }
    }
}

impl TestOp for Size {
    fn validate_arguments(&self, test: &Test) -> Result<()> {
        Self::parse(test).map(|_| ())
    }

    fn call(&self, test: &Test, mail: &dyn MailAdapter, _ctx: &mut EvalContext) -> Result<bool> {
        let (comparator, limit) = Self::parse(test)?;
        Ok(comparator.holds(mail.size(), limit))
    }
}
