//! Control commands: `if`, `elsif`, `else`, `require` and `stop`.

use crate::model::mail::MailAdapter;
use crate::sieve::ast::{Argument, Block, Command, Test};
use crate::sieve::commands::{no_arguments, no_block, no_tests, CommandOp};
use crate::sieve::context::{EvalContext, Flow};
use crate::sieve::error::{Result, SieveError};

pub fn if_command() -> Box<dyn CommandOp> {
    Box::new(If)
}

pub fn elsif_command() -> Box<dyn CommandOp> {
    Box::new(Elsif)
}

pub fn else_command() -> Box<dyn CommandOp> {
    Box::new(Else)
}

pub fn require_command() -> Box<dyn CommandOp> {
    Box::new(Require)
}

pub fn stop_command() -> Box<dyn CommandOp> {
    Box::new(Stop)
}

/// Prefix marking a comparator in a `require` list.
pub const COMPARATOR_PREFIX: &str = "comparator-";

fn block_of(command: &Command) -> Result<&Block> {
    command
        .block
        .as_ref()
        .ok_or_else(|| SieveError::syntax(&command.name, command.line, "Expected a block"))
}

fn single_test(command: &Command) -> Result<&Test> {
    if !command.arguments.positional.is_empty() {
        return Err(SieveError::syntax(
            &command.name,
            command.line,
            "Expected a test, found arguments",
        ));
    }
    match command.arguments.tests() {
        [test] => Ok(test),
        tests => Err(SieveError::syntax(
            &command.name,
            command.line,
            format!("Expected exactly one test, found {}", tests.len()),
        )),
    }
}

/// Evaluates the command's test and runs its block when it holds, then
/// records the result for any `elsif`/`else` that follows.
fn run_branch(command: &Command, mail: &mut dyn MailAdapter, ctx: &mut EvalContext) -> Result<Flow> {
    let test = single_test(command)?;
    let block = block_of(command)?;

    let result = ctx.evaluate_test(test, &*mail)?;
    let flow = if result {
        ctx.execute_block(block, mail)?
    } else {
        Flow::Continue
    };
    ctx.condition.record(result);

    Ok(flow)
}

struct If;

impl CommandOp for If {
    fn validate_arguments(&self, command: &Command) -> Result<()> {
        block_of(command)?;
        single_test(command).map(|_| ())
    }

    fn execute(
        &self,
        command: &Command,
        mail: &mut dyn MailAdapter,
        ctx: &mut EvalContext,
    ) -> Result<Flow> {
        run_branch(command, mail, ctx)
    }

    fn update_state(&self, _command: &Command, ctx: &mut EvalContext) {
        ctx.command_state.in_prolog = false;
    }
}

struct Elsif;

impl CommandOp for Elsif {
    fn validate_state(&self, command: &Command, ctx: &EvalContext) -> Result<()> {
        if ctx.condition.else_allowed {
            Ok(())
        } else {
            Err(SieveError::command(
                &command.name,
                command.line,
                "Unexpected 'elsif' without a preceding 'if'",
            ))
        }
    }

    fn validate_arguments(&self, command: &Command) -> Result<()> {
        block_of(command)?;
        single_test(command).map(|_| ())
    }

    fn execute(
        &self,
        command: &Command,
        mail: &mut dyn MailAdapter,
        ctx: &mut EvalContext,
    ) -> Result<Flow> {
        // An earlier branch already ran: skip without evaluating the test
        if !ctx.condition.is_else_runnable() {
            return Ok(Flow::Continue);
        }
        run_branch(command, mail, ctx)
    }

    fn update_state(&self, _command: &Command, ctx: &mut EvalContext) {
        ctx.command_state.in_prolog = false;
    }
}

struct Else;

impl CommandOp for Else {
    fn validate_state(&self, command: &Command, ctx: &EvalContext) -> Result<()> {
        if ctx.condition.else_allowed {
            Ok(())
        } else {
            Err(SieveError::command(
                &command.name,
                command.line,
                "Unexpected 'else' without a preceding 'if'",
            ))
        }
    }

    fn validate_arguments(&self, command: &Command) -> Result<()> {
        block_of(command)?;
        if command.arguments.is_empty() {
            Ok(())
        } else {
            Err(SieveError::syntax(
                &command.name,
                command.line,
                "Command takes no arguments",
            ))
        }
    }

    fn execute(
        &self,
        command: &Command,
        mail: &mut dyn MailAdapter,
        ctx: &mut EvalContext,
    ) -> Result<Flow> {
        if !ctx.condition.is_else_runnable() {
            return Ok(Flow::Continue);
        }
        ctx.execute_block(block_of(command)?, mail)
    }
}

struct Require;

impl Require {
    fn features(command: &Command) -> Result<Vec<String>> {
        match command.arguments.positional.as_slice() {
            [argument @ (Argument::String(_) | Argument::StringList(_))] => {
                Ok(argument.as_string_list().unwrap_or_default())
            }
            _ => Err(SieveError::syntax(
                &command.name,
                command.line,
                "Expected a string or string list of capabilities",
            )),
        }
    }
}

impl CommandOp for Require {
    fn validate_state(&self, command: &Command, ctx: &EvalContext) -> Result<()> {
        if ctx.command_state.in_prolog {
            Ok(())
        } else {
            Err(SieveError::command(
                &command.name,
                command.line,
                "'require' is only allowed before any other command",
            ))
        }
    }

    fn validate_arguments(&self, command: &Command) -> Result<()> {
        no_block(command)?;
        no_tests(command)?;
        Self::features(command).map(|_| ())
    }

    fn execute(
        &self,
        command: &Command,
        _mail: &mut dyn MailAdapter,
        ctx: &mut EvalContext,
    ) -> Result<Flow> {
        let registries = ctx.registries;
        for feature in Self::features(command)? {
            let supported = match feature.strip_prefix(COMPARATOR_PREFIX) {
                Some(comparator) => registries.comparators.is_supported(comparator),
                None => {
                    registries.commands.is_supported(&feature)
                        || registries.tests.is_supported(&feature)
                }
            };
            if !supported {
                return Err(SieveError::Feature(feature));
            }
        }
        Ok(Flow::Continue)
    }

    fn update_state(&self, _command: &Command, ctx: &mut EvalContext) {
        ctx.condition.reset();
    }
}

struct Stop;

impl CommandOp for Stop {
    fn validate_arguments(&self, command: &Command) -> Result<()> {
        no_arguments(command)
    }

    fn execute(
        &self,
        _command: &Command,
        _mail: &mut dyn MailAdapter,
        _ctx: &mut EvalContext,
    ) -> Result<Flow> {
        Ok(Flow::Stop)
    }
}
