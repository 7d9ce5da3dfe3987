//! Entry point tying the front end, validator, evaluator and dispatcher
//! together.
//!
//! An [`Engine`] owns the registries and is immutable once built, so a single
//! instance and any scripts it parsed can serve concurrent evaluations.

use crate::config::settings::EngineConfig;
use crate::model::action::Action;
use crate::model::mail::MailAdapter;
use crate::sieve::ast::Script;
use crate::sieve::commands::CommandOp;
use crate::sieve::comparator::Comparator;
use crate::sieve::conditions::TestOp;
use crate::sieve::context::EvalContext;
use crate::sieve::dispatcher::{ActionContext, ActionDispatcher, Delivery};
use crate::sieve::error::Result;
use crate::sieve::registry::{Factory, Registries};
use crate::sieve::{builder, parser, validator};

pub struct Engine {
    registries: Registries,
    config: EngineConfig,
}

impl Engine {
    /// Every built-in command, test and comparator.
    pub fn with_defaults() -> Self {
        Self {
            registries: Registries::builtin(),
            config: EngineConfig::default(),
        }
    }

    pub fn from_config(config: EngineConfig) -> Result<Self> {
        Ok(Self {
            registries: Registries::from_config(&config.registry)?,
            config,
        })
    }

    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn registries(&self) -> &Registries {
        &self.registries
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Parses, builds and validates script text.
    pub fn parse(&self, text: &str) -> Result<Script> {
        let raw = parser::parse(text)?;
        let script = builder::build(&raw)?;
        self.validate(&script)?;
        Ok(script)
    }

    pub fn validate(&self, script: &Script) -> Result<()> {
        validator::validate(script, &self.registries)
    }

    /// Walks `script` against one message, appending actions to `mail`.
    ///
    /// On error the walk stops where it failed and actions appended so far
    /// are left in place.
    pub fn evaluate(&self, script: &Script, mail: &mut dyn MailAdapter) -> Result<()> {
        let span = tracing::debug_span!("sieve", commands = script.commands.len());
        let _guard = span.enter();
        tracing::debug!(context = "sieve", event = "start", size = mail.size());

        let mut ctx = EvalContext::new(&self.registries, self.config.max_steps);
        if let Err(e) = ctx.execute_commands(&script.commands, mail) {
            tracing::warn!(context = "sieve", event = "error", kind = e.kind(), reason = %e);
            return Err(e);
        }
        if ctx.command_state.implicit_keep {
            tracing::debug!(context = "sieve", event = "action", action = "keep", implicit = true);
            mail.add_action(Action::Keep);
        }

        tracing::debug!(
            context = "sieve",
            event = "end",
            actions = mail.actions().len(),
            steps = ctx.steps(),
        );
        Ok(())
    }

    pub fn dispatcher(&self) -> ActionDispatcher {
        ActionDispatcher::new(self.config.inbox.clone())
    }

    /// Evaluates and then dispatches the resulting actions.
    pub fn run(
        &self,
        script: &Script,
        mail: &mut dyn MailAdapter,
        delivery: &mut Delivery,
        context: &mut dyn ActionContext,
    ) -> Result<()> {
        self.evaluate(script, mail)?;
        self.dispatcher().dispatch(mail.actions(), delivery, context)
    }

    /// Capabilities a script can `require`.
    pub fn extensions(&self) -> Vec<String> {
        self.registries.extensions()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Collects configuration and custom factories before the registries are
/// frozen into an [`Engine`].
#[derive(Default)]
pub struct EngineBuilder {
    config: EngineConfig,
    commands: Vec<(String, Factory<dyn CommandOp>)>,
    tests: Vec<(String, Factory<dyn TestOp>)>,
    comparators: Vec<(String, Factory<dyn Comparator>)>,
}

impl EngineBuilder {
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn command(mut self, name: &str, factory: Factory<dyn CommandOp>) -> Self {
        self.commands.push((name.to_string(), factory));
        self
    }

    pub fn test(mut self, name: &str, factory: Factory<dyn TestOp>) -> Self {
        self.tests.push((name.to_string(), factory));
        self
    }

    pub fn comparator(mut self, name: &str, factory: Factory<dyn Comparator>) -> Self {
        self.comparators.push((name.to_string(), factory));
        self
    }

    pub fn build(self) -> Result<Engine> {
        let mut registries = Registries::from_config(&self.config.registry)?;
        for (name, factory) in self.commands {
            registries.commands.register(&name, factory);
        }
        for (name, factory) in self.tests {
            registries.tests.register(&name, factory);
        }
        for (name, factory) in self.comparators {
            registries.comparators.register(&name, factory);
        }
        Ok(Engine {
            registries,
            config: self.config,
        })
    }
}
