mod cli;

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use tracing::Level;

use cli::{Cli, Commands};
use sieve_engine::store::script_io::{load_message, load_script};
use sieve_engine::{
    Action, Delivery, Engine, EngineConfig, FolderStore, MailAdapter, ParsedMessage, Result,
};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(kind = e.kind(), "{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = EngineConfig::discover(cli.config.as_deref())?;
    let engine = Engine::from_config(config)?;

    match cli.command {
        Commands::Check { script } => {
            engine.parse(&load_script(&script)?)?;
            println!("{}: ok", script.display());
        }
        Commands::Run {
            script,
            message,
            from,
            to,
            recipients,
            deliver,
            json,
        } => {
            let script = engine.parse(&load_script(&script)?)?;
            let mut message = load_message(&message)?.with_envelope(from.clone(), to.clone());
            engine.evaluate(&script, &mut message)?;
            print_actions(message.actions(), json)?;

            if let Some(root) = deliver {
                let recipients = if recipients.is_empty() {
                    to.into_iter().collect()
                } else {
                    recipients
                };
                dispatch(&engine, &message, from, recipients, &root)?;
            }
        }
        Commands::Extensions => {
            for name in engine.extensions() {
                println!("{name}");
            }
        }
    }
    Ok(())
}

fn print_actions(actions: &[Action], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(actions)?);
        return Ok(());
    }
    for action in actions {
        match action {
            Action::Keep => println!("keep"),
            Action::FileInto { destination } => println!("fileinto \"{destination}\""),
            Action::Redirect { address } => println!("redirect \"{address}\""),
            Action::Reject { message } => println!("reject \"{message}\""),
            Action::Vacation(vacation) => {
                println!("vacation :days {} \"{}\"", vacation.days, vacation.reason)
            }
        }
    }
    Ok(())
}

fn dispatch(
    engine: &Engine,
    message: &ParsedMessage,
    sender: Option<String>,
    recipients: Vec<String>,
    root: &Path,
) -> Result<()> {
    let mut delivery = Delivery::new(sender, recipients, message);
    let mut store = FolderStore::new(root);
    engine
        .dispatcher()
        .dispatch(message.actions(), &mut delivery, &mut store)?;
    tracing::info!(root = %store.root().display(), "delivery complete");
    Ok(())
}
