//! Action commands: `keep`, `discard`, `fileinto`, `redirect` and `reject`.

use crate::model::action::Action;
use crate::model::address::parse_mailbox;
use crate::model::mail::MailAdapter;
use crate::sieve::ast::Command;
use crate::sieve::commands::{no_arguments, single_string, CommandOp};
use crate::sieve::context::{EvalContext, Flow};
use crate::sieve::error::{Result, SieveError};

pub fn keep_command() -> Box<dyn CommandOp> {
    Box::new(Keep)
}

pub fn discard_command() -> Box<dyn CommandOp> {
    Box::new(Discard)
}

pub fn fileinto_command() -> Box<dyn CommandOp> {
    Box::new(FileInto)
}

pub fn redirect_command() -> Box<dyn CommandOp> {
    Box::new(Redirect)
}

pub fn reject_command() -> Box<dyn CommandOp> {
    Box::new(Reject)
}

/// Shared by every command that emits an action.
pub(crate) fn ensure_not_rejected(command: &Command, ctx: &EvalContext) -> Result<()> {
    if ctx.command_state.rejected {
        Err(SieveError::command(
            &command.name,
            command.line,
            "Cannot perform actions on a rejected message",
        ))
    } else {
        Ok(())
    }
}

pub(crate) fn commit_action(ctx: &mut EvalContext) {
    ctx.command_state.in_prolog = false;
    ctx.command_state.has_actions = true;
    ctx.condition.reset();
}

/// Appends an action that replaces the implicit keep.
fn emit(command: &Command, mail: &mut dyn MailAdapter, ctx: &mut EvalContext, action: Action) {
    tracing::debug!(
        context = "sieve",
        event = "action",
        action = action.name(),
        line = command.line,
    );
    mail.add_action(action);
    ctx.command_state.implicit_keep = false;
}

struct Keep;

impl CommandOp for Keep {
    fn validate_state(&self, command: &Command, ctx: &EvalContext) -> Result<()> {
        ensure_not_rejected(command, ctx)
    }

    fn validate_arguments(&self, command: &Command) -> Result<()> {
        no_arguments(command)
    }

    fn execute(
        &self,
        command: &Command,
        mail: &mut dyn MailAdapter,
        ctx: &mut EvalContext,
    ) -> Result<Flow> {
        emit(command, mail, ctx, Action::Keep);
        Ok(Flow::Continue)
    }

    fn update_state(&self, _command: &Command, ctx: &mut EvalContext) {
        commit_action(ctx);
    }
}

struct Discard;

impl CommandOp for Discard {
    fn validate_arguments(&self, command: &Command) -> Result<()> {
        no_arguments(command)
    }

    fn execute(
        &self,
        command: &Command,
        _mail: &mut dyn MailAdapter,
        ctx: &mut EvalContext,
    ) -> Result<Flow> {
        tracing::debug!(context = "sieve", event = "discard", line = command.line);
        ctx.command_state.implicit_keep = false;
        Ok(Flow::Continue)
    }

    fn update_state(&self, _command: &Command, ctx: &mut EvalContext) {
        commit_action(ctx);
    }
}

struct FileInto;

impl CommandOp for FileInto {
    fn validate_state(&self, command: &Command, ctx: &EvalContext) -> Result<()> {
        ensure_not_rejected(command, ctx)
    }

    fn validate_arguments(&self, command: &Command) -> Result<()> {
        single_string(command).map(|_| ())
    }

    fn execute(
        &self,
        command: &Command,
        mail: &mut dyn MailAdapter,
        ctx: &mut EvalContext,
    ) -> Result<Flow> {
        let destination = single_string(command)?.to_string();
        emit(command, mail, ctx, Action::FileInto { destination });
        Ok(Flow::Continue)
    }

    fn update_state(&self, _command: &Command, ctx: &mut EvalContext) {
        commit_action(ctx);
    }
}

struct Redirect;

impl CommandOp for Redirect {
    fn validate_state(&self, command: &Command, ctx: &EvalContext) -> Result<()> {
        ensure_not_rejected(command, ctx)
    }

    fn validate_arguments(&self, command: &Command) -> Result<()> {
        let address = single_string(command)?;
        parse_mailbox(address).map(|_| ()).map_err(|e| {
            SieveError::syntax(
                &command.name,
                command.line,
                format!("Invalid address \"{address}\": {e}"),
            )
        })
    }

    fn execute(
        &self,
        command: &Command,
        mail: &mut dyn MailAdapter,
        ctx: &mut EvalContext,
    ) -> Result<Flow> {
        let address = single_string(command)?.to_string();
        emit(command, mail, ctx, Action::Redirect { address });
        Ok(Flow::Continue)
    }

    fn update_state(&self, _command: &Command, ctx: &mut EvalContext) {
        commit_action(ctx);
    }
}

struct Reject;

impl CommandOp for Reject {
    fn validate_state(&self, command: &Command, ctx: &EvalContext) -> Result<()> {
        ensure_not_rejected(command, ctx)
    }

    fn validate_arguments(&self, command: &Command) -> Result<()> {
        single_string(command).map(|_| ())
    }

    fn execute(
        &self,
        command: &Command,
        mail: &mut dyn MailAdapter,
        ctx: &mut EvalContext,
    ) -> Result<Flow> {
        let message = single_string(command)?.to_string();
        ctx.command_state.rejected = true;
        emit(command, mail, ctx, Action::Reject { message });
        Ok(Flow::Continue)
    }

    fn update_state(&self, _command: &Command, ctx: &mut EvalContext) {
        commit_action(ctx);
    }
}
