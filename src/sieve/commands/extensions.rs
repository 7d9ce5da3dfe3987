//! Extension commands: `vacation` (RFC 5230) and `log`.

use crate::model::action::{Action, Vacation};
use crate::model::enums::LogLevel;
use crate::model::mail::MailAdapter;
use crate::sieve::ast::{Argument, Command};
use crate::sieve::commands::actions::{commit_action, ensure_not_rejected};
use crate::sieve::commands::{no_block, no_tests, CommandOp};
use crate::sieve::context::{EvalContext, Flow};
use crate::sieve::error::{Result, SieveError};

pub fn vacation_command() -> Box<dyn CommandOp> {
    Box::new(VacationCommand)
}

pub fn log_command() -> Box<dyn CommandOp> {
    Box::new(Log)
}

const DEFAULT_VACATION_DAYS: u64 = 7;

struct VacationCommand;

impl VacationCommand {
    fn parse(command: &Command) -> Result<Vacation> {
        no_block(command)?;
        no_tests(command)?;
        let syntax = |message: String| SieveError::syntax(&command.name, command.line, message);

        let mut vacation = Vacation {
            days: DEFAULT_VACATION_DAYS,
            subject: None,
            from: None,
            addresses: Vec::new(),
            mime: false,
            handle: None,
            reason: String::new(),
        };
        let mut reason = None;
        let mut args = command.arguments.positional.iter();

        while let Some(arg) = args.next() {
            if reason.is_some() {
                return Err(syntax("Unexpected argument after the reason".to_string()));
            }
            match arg {
                Argument::Tag(tag) => match tag.as_str() {
                    ":days" => {
                        let days = args.next().and_then(Argument::as_number).ok_or_else(|| {
                            syntax("Expected a number after :days".to_string())
                        })?;
                        vacation.days = days.max(1);
                    }
                    ":subject" | ":from" | ":handle" => {
                        let value = args
                            .next()
                            .and_then(Argument::as_string)
                            .ok_or_else(|| syntax(format!("Expected a string after {tag}")))?
                            .to_string();
                        match tag.as_str() {
                            ":subject" => vacation.subject = Some(value),
                            ":from" => vacation.from = Some(value),
                            _ => vacation.handle = Some(value),
                        }
                    }
                    ":addresses" => {
                        vacation.addresses = args
                            .next()
                            .and_then(Argument::as_string_list)
                            .ok_or_else(|| syntax("Expected addresses after :addresses".to_string()))?;
                    }
                    ":mime" => vacation.mime = true,
                    other => return Err(syntax(format!("Unknown tag {other}"))),
                },
                Argument::String(s) => reason = Some(s.clone()),
                other => {
                    return Err(syntax(format!("Unexpected {} argument", other.describe())));
                }
            }
        }

        vacation.reason = reason.ok_or_else(|| syntax("Missing vacation reason".to_string()))?;
        Ok(vacation)
    }
}

impl CommandOp for VacationCommand {
    fn validate_state(&self, command: &Command, ctx: &EvalContext) -> Result<()> {
        ensure_not_rejected(command, ctx)
    }

    fn validate_arguments(&self, command: &Command) -> Result<()> {
        Self::parse(command).map(|_| ())
    }

    fn execute(
        &self,
        command: &Command,
        mail: &mut dyn MailAdapter,
        _ctx: &mut EvalContext,
    ) -> Result<Flow> {
        let vacation = Self::parse(command)?;
        tracing::debug!(
            context = "sieve",
            event = "action",
            action = "vacation",
            days = vacation.days,
            line = command.line,
        );
        // Vacation does not cancel the implicit keep
        mail.add_action(Action::Vacation(vacation));
        Ok(Flow::Continue)
    }

    fn update_state(&self, _command: &Command, ctx: &mut EvalContext) {
        commit_action(ctx);
    }
}

struct Log;

impl Log {
    fn parse(command: &Command) -> Result<(LogLevel, &str)> {
        no_block(command)?;
        no_tests(command)?;
        let syntax = |message: &str| SieveError::syntax(&command.name, command.line, message);

        match command.arguments.positional.as_slice() {
            [Argument::String(message)] => Ok((LogLevel::default(), message)),
            [Argument::Tag(tag), Argument::String(message)] => {
                let level = LogLevel::from_sieve(tag)
                    .ok_or_else(|| syntax(&format!("Unknown log level {tag}")))?;
                Ok((level, message))
            }
            _ => Err(syntax("Expected an optional level tag and a message")),
        }
    }
}

impl CommandOp for Log {
    fn validate_arguments(&self, command: &Command) -> Result<()> {
        Self::parse(command).map(|_| ())
    }

    fn execute(
        &self,
        command: &Command,
        _mail: &mut dyn MailAdapter,
        _ctx: &mut EvalContext,
    ) -> Result<Flow> {
        let (level, message) = Self::parse(command)?;
        let line = command.line;
        match level {
            LogLevel::Fatal => tracing::error!(context = "sieve", fatal = true, line, "{message}"),
            LogLevel::Error => tracing::error!(context = "sieve", line, "{message}"),
            LogLevel::Warn => tracing::warn!(context = "sieve", line, "{message}"),
            LogLevel::Info => tracing::info!(context = "sieve", line, "{message}"),
            LogLevel::Debug => tracing::debug!(context = "sieve", line, "{message}"),
            LogLevel::Trace => tracing::trace!(context = "sieve", line, "{message}"),
        }
        Ok(Flow::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sieve::ast::Arguments;

    fn command(name: &str, positional: Vec<Argument>) -> Command {
        Command {
            name: name.to_string(),
            arguments: Arguments {
                positional,
                tests: None,
            },
            block: None,
            line: 1,
        }
    }

    fn tag(t: &str) -> Argument {
        Argument::Tag(t.to_string())
    }

    fn string(s: &str) -> Argument {
        Argument::String(s.to_string())
    }

    #[test]
    fn test_vacation_arguments() {
        let cmd = command(
            "vacation",
            vec![
                tag(":days"),
                Argument::Number(0),
                tag(":subject"),
                string("Out of office"),
                tag(":addresses"),
                Argument::StringList(vec!["me@example.com".to_string()]),
                tag(":mime"),
                string("Back on Monday"),
            ],
        );
        let vacation = VacationCommand::parse(&cmd).unwrap();
        assert_eq!(vacation.days, 1);
        assert_eq!(vacation.subject.as_deref(), Some("Out of office"));
        assert_eq!(vacation.addresses, vec!["me@example.com"]);
        assert!(vacation.mime);
        assert_eq!(vacation.reason, "Back on Monday");

        let defaults = VacationCommand::parse(&command("vacation", vec![string("Away")])).unwrap();
        assert_eq!(defaults.days, DEFAULT_VACATION_DAYS);
    }

    #[test]
    fn test_vacation_rejects_bad_arguments() {
        assert!(VacationCommand::parse(&command("vacation", vec![])).is_err());
        assert!(VacationCommand::parse(&command("vacation", vec![tag(":days"), string("x")])).is_err());
        assert!(
            VacationCommand::parse(&command("vacation", vec![string("a"), string("b")])).is_err()
        );
        assert!(VacationCommand::parse(&command("vacation", vec![tag(":bogus"), string("a")])).is_err());
    }

    #[test]
    fn test_log_arguments() {
        let hello = command("log", vec![string("hello")]);
        let (level, message) = Log::parse(&hello).unwrap();
        assert_eq!(level, LogLevel::Info);
        assert_eq!(message, "hello");

        let cmd = command("log", vec![tag(":warn"), string("careful")]);
        assert_eq!(Log::parse(&cmd).unwrap().0, LogLevel::Warn);

        assert!(Log::parse(&command("log", vec![tag(":loud"), string("x")])).is_err());
        assert!(Log::parse(&command("log", vec![])).is_err());
    }
}
