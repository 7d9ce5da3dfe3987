//! Untyped parse tree handed from the grammar to the semantic tree builder.
//!
//! Shape produced by the parser:
//! - `Start` holds `Command` children
//! - `Command` carries its name and holds `Arguments` and an optional `Block`
//! - `Arguments` holds `Argument` children followed by an optional `Test` or `TestList`
//! - `Argument` wraps exactly one `String`, `Number`, `Tag` or `StringList`
//! - `Test` carries its name and holds `Arguments`
//! - `TestList` holds `Test` children, `Block` holds `Command` children

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Start,
    Command,
    Block,
    Arguments,
    Argument,
    TestList,
    Test,
    StringList,
    String,
    Number,
    Tag,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawNode {
    pub kind: NodeKind,
    /// Literal token value: identifier, string contents, number text or tag.
    pub token: Option<String>,
    pub children: Vec<RawNode>,
    pub line: usize,
    pub column: usize,
}

impl RawNode {
    pub fn new(kind: NodeKind, line: usize, column: usize) -> Self {
        Self {
            kind,
            token: None,
            children: Vec::new(),
            line,
            column,
        }
    }

    pub fn leaf(kind: NodeKind, token: String, line: usize, column: usize) -> Self {
        Self {
            kind,
            token: Some(token),
            children: Vec::new(),
            line,
            column,
        }
    }

    pub fn with_token(mut self, token: String) -> Self {
        self.token = Some(token);
        self
    }
}
