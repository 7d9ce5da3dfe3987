/// Semantic tree for SIEVE scripts (RFC 3028).
///
/// Built once per script and shared read-only by every evaluation.
pub type Commands = Vec<Command>;

/// A complete SIEVE script is a list of commands.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Script {
    pub commands: Commands,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    /// Lower-cased command name.
    pub name: String,
    pub arguments: Arguments,
    pub block: Option<Block>,
    pub line: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Block {
    pub commands: Commands,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    pub positional: Vec<Argument>,
    pub tests: Option<TestList>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    Tag(String),
    /// Absolute magnitude after applying any K/M/G suffix.
    Number(u64),
    String(String),
    StringList(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Test {
    /// Lower-cased test name.
    pub name: String,
    pub arguments: Arguments,
    pub line: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestList {
    pub tests: Vec<Test>,
}

impl Argument {
    pub fn as_tag(&self) -> Option<&str> {
        match self {
            Self::Tag(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<u64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Either argument shape a string-list parameter accepts.
    pub fn as_string_list(&self) -> Option<Vec<String>> {
        match self {
            Self::String(s) => Some(vec![s.clone()]),
            Self::StringList(items) => Some(items.clone()),
            _ => None,
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Self::Tag(_) => "tag",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::StringList(_) => "string list",
        }
    }
}

impl Arguments {
    pub fn tests(&self) -> &[Test] {
        self.tests.as_ref().map(|t| t.tests.as_slice()).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.tests.is_none()
    }
}
