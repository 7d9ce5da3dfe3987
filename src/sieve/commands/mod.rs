//! Commands: control flow, actions and extensions.
//!
//! Every command runs through the same four phases: `validate_state`,
//! `validate_arguments`, `execute`, then `update_state`.

pub mod actions;
pub mod control;
pub mod extensions;

use crate::model::mail::MailAdapter;
use crate::sieve::ast::{Argument, Command};
use crate::sieve::context::{EvalContext, Flow};
use crate::sieve::error::{Result, SieveError};
use crate::sieve::registry::Factory;

pub trait CommandOp {
    /// Rejects the command if the evaluation state forbids it here.
    fn validate_state(&self, _command: &Command, _ctx: &EvalContext) -> Result<()> {
        Ok(())
    }

    fn validate_arguments(&self, command: &Command) -> Result<()>;

    fn execute(
        &self,
        command: &Command,
        mail: &mut dyn MailAdapter,
        ctx: &mut EvalContext,
    ) -> Result<Flow>;

    /// Commits state transitions once the command has run. By default the
    /// prolog ends and any if/elsif chain is closed.
    fn update_state(&self, _command: &Command, ctx: &mut EvalContext) {
        ctx.command_state.in_prolog = false;
        ctx.condition.reset();
    }
}

pub const BUILTIN: &[(&str, Factory<dyn CommandOp>)] = &[
    ("if", control::if_command),
    ("elsif", control::elsif_command),
    ("else", control::else_command),
    ("require", control::require_command),
    ("stop", control::stop_command),
    ("keep", actions::keep_command),
    ("discard", actions::discard_command),
    ("fileinto", actions::fileinto_command),
    ("redirect", actions::redirect_command),
    ("reject", actions::reject_command),
    ("vacation", extensions::vacation_command),
    ("log", extensions::log_command),
];

pub(crate) fn no_block(command: &Command) -> Result<()> {
    match command.block {
        Some(_) => Err(SieveError::syntax(
            &command.name,
            command.line,
            "Command does not take a block",
        )),
        None => Ok(()),
    }
}

pub(crate) fn no_tests(command: &Command) -> Result<()> {
    match command.arguments.tests {
        Some(_) => Err(SieveError::syntax(
            &command.name,
            command.line,
            "Command does not take a test",
        )),
        None => Ok(()),
    }
}

pub(crate) fn no_arguments(command: &Command) -> Result<()> {
    no_block(command)?;
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

/// Exactly one positional argument, which must be a single string.
pub(crate) fn single_string(command: &Command) -> Result<&str> {
    no_block(command)?;
    no_tests(command)?;
    match command.arguments.positional.as_slice() {
        [Argument::String(s)] => Ok(s),
        [other] => Err(SieveError::syntax(
            &command.name,
            command.line,
            format!("Expected a string argument, found a {}", other.describe()),
        )),
        args => Err(SieveError::syntax(
            &command.name,
            command.line,
            format!("Expected exactly one string argument, found {}", args.len()),
        )),
    }
}
