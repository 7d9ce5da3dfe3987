//! Recursive descent SIEVE parser.
//!
//! Turns tokenized script text into the untyped [`RawNode`] tree. The parser
//! only knows the grammar; command and test names are resolved later by the
//! semantic tree builder and the validator.

use crate::sieve::error::{Result, SieveError};
use crate::sieve::lexer::{tokenize, Span, Token};
use crate::sieve::raw::{NodeKind, RawNode};

/// Deepest allowed nesting of blocks and tests combined. Every later pass
/// recurses over the same tree, so this bounds them all.
pub const MAX_NESTING: usize = 64;

pub fn parse(input: &str) -> Result<RawNode> {
    let spans = tokenize(input)?;
    let mut pos = 0;
    let mut root = RawNode::new(NodeKind::Start, 1, 1);

    while pos < spans.len() {
        root.children.push(parse_command(&spans, &mut pos, 0)?);
    }

    Ok(root)
}

fn error_at(spans: &[Span], pos: usize, message: String) -> SieveError {
    let (line, column) = match spans.get(pos).or_else(|| spans.last()) {
        Some(span) => (span.line, span.column),
        None => (1, 1),
    };
    SieveError::Parse {
        line,
        column,
        message,
    }
}

/// Depth of a block or test opened at `pos` inside one at `depth`.
fn nested(spans: &[Span], pos: usize, depth: usize) -> Result<usize> {
    if depth >= MAX_NESTING {
        return Err(error_at(
            spans,
            pos,
            format!("Nesting deeper than {MAX_NESTING} levels"),
        ));
    }
    Ok(depth + 1)
}

fn describe(spans: &[Span], pos: usize) -> String {
    match spans.get(pos) {
        Some(span) => format!("{:?}", span.token),
        None => "end of input".to_string(),
    }
}

fn parse_command(spans: &[Span], pos: &mut usize, depth: usize) -> Result<RawNode> {
    let span = &spans[*pos];
    let Token::Identifier(name) = &span.token else {
        return Err(error_at(
            spans,
            *pos,
            format!("Expected command, got {}", describe(spans, *pos)),
        ));
    };
    let mut command =
        RawNode::new(NodeKind::Command, span.line, span.column).with_token(name.clone());
    *pos += 1;

    command.children.push(parse_arguments(spans, pos, depth)?);

    match spans.get(*pos).map(|s| &s.token) {
        Some(Token::Semicolon) => {
            *pos += 1;
        }
        Some(Token::LBrace) => {
            command.children.push(parse_block(spans, pos, depth)?);
        }
        _ => {
            return Err(error_at(
                spans,
                *pos,
                format!(
                    "Expected ';' or '{{' after '{name}', got {}",
                    describe(spans, *pos)
                ),
            ));
        }
    }

    Ok(command)
}

fn parse_block(spans: &[Span], pos: &mut usize, depth: usize) -> Result<RawNode> {
    let depth = nested(spans, *pos, depth)?;
    let open = &spans[*pos];
    let mut block = RawNode::new(NodeKind::Block, open.line, open.column);
    *pos += 1;

    loop {
        match spans.get(*pos).map(|s| &s.token) {
            Some(Token::RBrace) => {
                *pos += 1;
                break;
            }
            Some(_) => block.children.push(parse_command(spans, pos, depth)?),
            None => {
                return Err(error_at(
                    spans,
                    *pos,
                    "Unexpected end of input in block".to_string(),
                ))
            }
        }
    }

    Ok(block)
}

fn parse_arguments(spans: &[Span], pos: &mut usize, depth: usize) -> Result<RawNode> {
    let (line, column) = spans
        .get(*pos)
        .or_else(|| spans.last())
        .map(|s| (s.line, s.column))
        .unwrap_or((1, 1));
    let mut arguments = RawNode::new(NodeKind::Arguments, line, column);

    while let Some(span) = spans.get(*pos) {
        let value = match &span.token {
            Token::QuotedString(s) | Token::MultiLineString(s) => {
                *pos += 1;
                RawNode::leaf(NodeKind::String, s.clone(), span.line, span.column)
            }
            Token::Number(n) => {
                *pos += 1;
                RawNode::leaf(NodeKind::Number, n.clone(), span.line, span.column)
            }
            Token::Tag(t) => {
                *pos += 1;
                RawNode::leaf(NodeKind::Tag, t.clone(), span.line, span.column)
            }
            Token::LBracket => parse_string_list(spans, pos)?,
            _ => break,
        };
        let mut argument = RawNode::new(NodeKind::Argument, span.line, span.column);
        argument.children.push(value);
        arguments.children.push(argument);
    }

    match spans.get(*pos).map(|s| &s.token) {
        Some(Token::Identifier(_)) => arguments.children.push(parse_test(spans, pos, depth)?),
        Some(Token::LParen) => arguments.children.push(parse_test_list(spans, pos, depth)?),
        _ => {}
    }

    Ok(arguments)
}

fn parse_string_list(spans: &[Span], pos: &mut usize) -> Result<RawNode> {
    let open = &spans[*pos];
    let mut list = RawNode::new(NodeKind::StringList, open.line, open.column);
    *pos += 1;

    loop {
        match spans.get(*pos).map(|s| &s.token) {
            Some(Token::QuotedString(s)) | Some(Token::MultiLineString(s)) => {
                let span = &spans[*pos];
                list.children
                    .push(RawNode::leaf(NodeKind::String, s.clone(), span.line, span.column));
                *pos += 1;
            }
            _ => {
                return Err(error_at(
                    spans,
                    *pos,
                    format!("Expected string in list, got {}", describe(spans, *pos)),
                ))
            }
        }
        match spans.get(*pos).map(|s| &s.token) {
            Some(Token::Comma) => *pos += 1,
            Some(Token::RBracket) => {
                *pos += 1;
                break;
            }
            _ => {
                return Err(error_at(
                    spans,
                    *pos,
                    format!("Expected ',' or ']' in list, got {}", describe(spans, *pos)),
                ))
            }
        }
    }

    Ok(list)
}

fn parse_test(spans: &[Span], pos: &mut usize, depth: usize) -> Result<RawNode> {
    let depth = nested(spans, *pos, depth)?;
    let span = &spans[*pos];
    let Token::Identifier(name) = &span.token else {
        return Err(error_at(
            spans,
            *pos,
            format!("Expected test, got {}", describe(spans, *pos)),
        ));
    };
    let mut test = RawNode::new(NodeKind::Test, span.line, span.column).with_token(name.clone());
    *pos += 1;
    test.children.push(parse_arguments(spans, pos, depth)?);
    Ok(test)
}

fn parse_test_list(spans: &[Span], pos: &mut usize, depth: usize) -> Result<RawNode> {
    let open = &spans[*pos];
    let mut list = RawNode::new(NodeKind::TestList, open.line, open.column);
    *pos += 1;

    loop {
        if !matches!(spans.get(*pos).map(|s| &s.token), Some(Token::Identifier(_))) {
            return Err(error_at(
                spans,
                *pos,
                format!("Expected test in test list, got {}", describe(spans, *pos)),
            ));
        }
        list.children.push(parse_test(spans, pos, depth)?);
        match spans.get(*pos).map(|s| &s.token) {
            Some(Token::Comma) => *pos += 1,
            Some(Token::RParen) => {
                *pos += 1;
                break;
            }
            _ => {
                return Err(error_at(
                    spans,
                    *pos,
                    format!("Expected ',' or ')' in test list, got {}", describe(spans, *pos)),
                ))
            }
        }
    }

    Ok(list)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(node: &RawNode) -> Vec<NodeKind> {
        node.children.iter().map(|c| c.kind).collect()
    }

    #[test]
    fn test_parse_empty() {
        let root = parse("").unwrap();
        assert_eq!(root.kind, NodeKind::Start);
        assert!(root.children.is_empty());

        let root = parse("  # only a comment\n").unwrap();
        assert!(root.children.is_empty());
    }

    #[test]
    fn test_parse_require_list() {
        let root = parse("require [\"fileinto\", \"reject\"];").unwrap();
        let command = &root.children[0];
        assert_eq!(command.token.as_deref(), Some("require"));
        assert_eq!(kinds(command), vec![NodeKind::Arguments]);

        let argument = &command.children[0].children[0];
        assert_eq!(argument.kind, NodeKind::Argument);
        let list = &argument.children[0];
        assert_eq!(list.kind, NodeKind::StringList);
        let values: Vec<_> = list.children.iter().filter_map(|c| c.token.as_deref()).collect();
        assert_eq!(values, vec!["fileinto", "reject"]);
    }

    #[test]
    fn test_parse_if_with_block() {
        let input = r#"
if header :contains "Subject" "SPAM" {
    fileinto "Junk";
    stop;
}
"#;
        let root = parse(input).unwrap();
        let command = &root.children[0];
        assert_eq!(command.line, 2);
        assert_eq!(kinds(command), vec![NodeKind::Arguments, NodeKind::Block]);

        let arguments = &command.children[0];
        assert_eq!(kinds(arguments), vec![NodeKind::Test]);
        let test = &arguments.children[0];
        assert_eq!(test.token.as_deref(), Some("header"));
        assert_eq!(test.children[0].children.len(), 3);

        let block = &command.children[1];
        assert_eq!(block.children.len(), 2);
    }

    #[test]
    fn test_parse_nested_test_list() {
        let input = r#"if allof (not exists "X", anyof (true, size :over 1K)) { keep; }"#;
        let root = parse(input).unwrap();
        let test = &root.children[0].children[0].children[0];
        assert_eq!(test.token.as_deref(), Some("allof"));
        let list = &test.children[0].children[0];
        assert_eq!(list.kind, NodeKind::TestList);
        assert_eq!(list.children.len(), 2);

        let not = &list.children[0];
        assert_eq!(not.token.as_deref(), Some("not"));
        assert_eq!(kinds(&not.children[0]), vec![NodeKind::Test]);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse("keep"), Err(SieveError::Parse { .. })));
        assert!(matches!(parse("if true { keep;"), Err(SieveError::Parse { .. })));
        assert!(matches!(parse("fileinto [\"a\" \"b\"];"), Err(SieveError::Parse { .. })));
        assert!(matches!(parse("if anyof () { keep; }"), Err(SieveError::Parse { .. })));
        assert!(matches!(parse("\"loose\";"), Err(SieveError::Parse { .. })));
    }

    #[test]
    fn test_nesting_limit() {
        let at_limit = format!("if {}true {{ keep; }}", "not ".repeat(MAX_NESTING - 1));
        assert!(parse(&at_limit).is_ok());

        let too_deep = format!("if {}true {{ keep; }}", "not ".repeat(MAX_NESTING));
        assert!(matches!(
            parse(&too_deep),
            Err(SieveError::Parse { ref message, .. }) if message.contains("Nesting")
        ));

        let blocks = format!(
            "{}keep;{}",
            "if true { ".repeat(MAX_NESTING + 1),
            "}".repeat(MAX_NESTING + 1)
        );
        assert!(matches!(parse(&blocks), Err(SieveError::Parse { .. })));

        let huge = format!("if {}true {{ keep; }}", "not ".repeat(200_000));
        assert!(matches!(parse(&huge), Err(SieveError::Parse { .. })));
    }
}
