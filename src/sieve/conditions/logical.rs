//! `not`, `allof`, `anyof`, `true` and `false`.

use crate::model::mail::MailAdapter;
use crate::sieve::ast::Test;
use crate::sieve::conditions::TestOp;
use crate::sieve::context::EvalContext;
use crate::sieve::error::{Result, SieveError};

pub fn not_test() -> Box<dyn TestOp> {
    Box::new(Not)
}

pub fn allof_test() -> Box<dyn TestOp> {
    Box::new(AllOf)
}

pub fn anyof_test() -> Box<dyn TestOp> {
    Box::new(AnyOf)
}

pub fn true_test() -> Box<dyn TestOp> {
    Box::new(Constant(true))
}

pub fn false_test() -> Box<dyn TestOp> {
    Box::new(Constant(false))
}

/// The nested tests, of which there must be at least `min` and at most `max`.
fn nested(test: &Test, min: usize, max: Option<usize>) -> Result<&[Test]> {
    if !test.arguments.positional.is_empty() {
        return Err(SieveError::syntax(
            &test.name,
            test.line,
            "Test takes only nested tests",
        ));
    }
    let tests = test.arguments.tests();
    if tests.len() < min || max.is_some_and(|max| tests.len() > max) {
        return Err(SieveError::syntax(
            &test.name,
            test.line,
            format!("Unexpected number of nested tests: {}", tests.len()),
        ));
    }
    Ok(tests)
}

struct Not;

impl TestOp for Not {
    fn validate_arguments(&self, test: &Test) -> Result<()> {
        nested(test, 1, Some(1)).map(|_| ())
    }

    fn call(&self, test: &Test, mail: &dyn MailAdapter, ctx: &mut EvalContext) -> Result<bool> {
        let inner = nested(test, 1, Some(1))?;
        Ok(!ctx.evaluate_test(&inner[0], mail)?)
    }
}

struct AllOf;

impl TestOp for AllOf {
    fn validate_arguments(&self, test: &Test) -> Result<()> {
        nested(test, 1, None).map(|_| ())
    }

    fn call(&self, test: &Test, mail: &dyn MailAdapter, ctx: &mut EvalContext) -> Result<bool> {
        for inner in nested(test, 1, None)? {
            if !ctx.evaluate_test(inner, mail)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

struct AnyOf;

impl TestOp for AnyOf {
    fn validate_arguments(&self, test: &Test) -> Result<()> {
        nested(test, 1, None).map(|_| ())
    }

    fn call(&self, test: &Test, mail: &dyn MailAdapter, ctx: &mut EvalContext) -> Result<bool> {
        for inner in nested(test, 1, None)? {
            if ctx.evaluate_test(inner, mail)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

struct Constant(bool);

impl TestOp for Constant {
    fn validate_arguments(&self, test: &Test) -> Result<()> {
        if test.arguments.is_empty() {
            Ok(())
        } else {
            Err(SieveError::syntax(
                &test.name,
                test.line,
                "Test takes no arguments",
            ))
        }
    }

    fn call(&self, _test: &Test, _mail: &dyn MailAdapter, _ctx: &mut EvalContext) -> Result<bool> {
        Ok(self.0)
    }
}
