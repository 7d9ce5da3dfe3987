//! Error taxonomy shared by the parser, validator, evaluator and dispatcher.

pub type Result<T> = std::result::Result<T, SieveError>;

#[derive(Debug, thiserror::Error)]
pub enum SieveError {
    /// Malformed script text.
    #[error("Parse error at line {line}, column {column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },

    /// Static validation failed before any evaluation took place.
    #[error("Validation error at line {line}: {message}")]
    Validation { line: usize, message: String },

    /// Wrong argument arity or shape for a command or test.
    #[error("Syntax error in '{name}' at line {line}: {message}")]
    Syntax {
        name: String,
        line: usize,
        message: String,
    },

    /// A command is illegal at this point of the evaluation.
    #[error("Command error in '{name}' at line {line}: {message}")]
    Command {
        name: String,
        line: usize,
        message: String,
    },

    #[error("Feature \"{0}\" is not supported")]
    Feature(String),

    #[error("No implementation registered for \"{0}\"")]
    Lookup(String),

    #[error("Cannot parse address in \"{header}\": {message}")]
    AddressParse { header: String, message: String },

    #[error("Message is looping: {action} already handled for {recipient}")]
    LoopDetected { action: String, recipient: String },

    #[error("Message has {count} recipients, exactly one is required for {action}")]
    Recipients { action: String, count: usize },

    #[error("Delivery error: {0}")]
    Delivery(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

impl SieveError {
    pub fn syntax(name: &str, line: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            name: name.to_string(),
            line,
            message: message.into(),
        }
    }

    pub fn command(name: &str, line: usize, message: impl Into<String>) -> Self {
        Self::Command {
            name: name.to_string(),
            line,
            message: message.into(),
        }
    }

    pub fn validation(line: usize, message: impl Into<String>) -> Self {
        Self::Validation {
            line,
            message: message.into(),
        }
    }

    /// Short machine-friendly label used in log events.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Parse { .. } => "parse",
            Self::Validation { .. } => "validation",
            Self::Syntax { .. } => "syntax",
            Self::Command { .. } => "command",
            Self::Feature(_) => "feature",
            Self::Lookup(_) => "lookup",
            Self::AddressParse { .. } => "address-parse",
            Self::LoopDetected { .. } => "loop-detected",
            Self::Recipients { .. } => "recipients",
            Self::Delivery(_) => "delivery",
            Self::Io(_) => "io",
            Self::Config(_) => "config",
        }
    }
}
