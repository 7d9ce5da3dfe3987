use crate::model::mail::MailAdapter;
use crate::sieve::ast::{Block, Command, Commands, Test};
use crate::sieve::comparator::Comparator;
use crate::sieve::error::{Result, SieveError};
use crate::sieve::registry::Registries;
use crate::sieve::state::{CommandState, ConditionState};

/// Whether the walk continues after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// Mutable state of one evaluation. Created per message, never shared.
pub struct EvalContext<'r> {
    pub registries: &'r Registries,
    pub command_state: CommandState,
    pub condition: ConditionState,
    max_steps: Option<u64>,
    steps: u64,
}

impl<'r> EvalContext<'r> {
    pub fn new(registries: &'r Registries, max_steps: Option<u64>) -> Self {
        Self {
            registries,
            command_state: CommandState::default(),
            condition: ConditionState::default(),
            max_steps,
            steps: 0,
        }
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    fn tick(&mut self, name: &str, line: usize) -> Result<()> {
        self.steps += 1;
        match self.max_steps {
            Some(max) if self.steps > max => Err(SieveError::command(
                name,
                line,
                format!("Evaluation step budget of {max} exceeded"),
            )),
            _ => Ok(()),
        }
    }

    /// Runs commands in order until one stops the walk.
    pub fn execute_commands(
        &mut self,
        commands: &Commands,
        mail: &mut dyn MailAdapter,
    ) -> Result<Flow> {
        for command in commands {
            if self.execute_command(command, mail)? == Flow::Stop {
                return Ok(Flow::Stop);
            }
        }
        Ok(Flow::Continue)
    }

    /// Runs a nested block. An `elsif`/`else` at its head never continues an
    /// enclosing chain, and a `require` inside it is never in the prolog.
    pub fn execute_block(&mut self, block: &Block, mail: &mut dyn MailAdapter) -> Result<Flow> {
        self.command_state.in_prolog = false;
        self.condition.reset();
        self.execute_commands(&block.commands, mail)
    }

    pub fn execute_command(&mut self, command: &Command, mail: &mut dyn MailAdapter) -> Result<Flow> {
        self.tick(&command.name, command.line)?;
        let op = self.registries.commands.lookup(&command.name)?;

        op.validate_state(command, self)?;
        op.validate_arguments(command)?;
        tracing::trace!(
            context = "sieve",
            event = "command",
            command = command.name.as_str(),
            line = command.line,
        );
        let flow = op.execute(command, mail, self)?;
        op.update_state(command, self);

        Ok(flow)
    }

    pub fn evaluate_test(&mut self, test: &Test, mail: &dyn MailAdapter) -> Result<bool> {
        self.tick(&test.name, test.line)?;
        let op = self.registries.tests.lookup(&test.name)?;

        op.validate_arguments(test)?;
        let result = op.call(test, mail, self)?;
        tracing::trace!(
            context = "sieve",
            event = "test",
            test = test.name.as_str(),
            line = test.line,
            result,
        );

        Ok(result)
    }

    pub fn comparator(&self, name: &str) -> Result<Box<dyn Comparator>> {
        self.registries.comparators.lookup(name)
    }
}
