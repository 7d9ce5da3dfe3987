//! Semantic tree builder: raw parse tree in, typed [`Script`] out.

use crate::sieve::ast::*;
use crate::sieve::error::{Result, SieveError};
use crate::sieve::raw::{NodeKind, RawNode};

const KILO: u64 = 1 << 10;
const MEGA: u64 = 1 << 20;
const GIGA: u64 = 1 << 30;

pub fn build(root: &RawNode) -> Result<Script> {
    expect(root, NodeKind::Start)?;
    let commands = root
        .children
        .iter()
        .map(build_command)
        .collect::<Result<Commands>>()?;
    Ok(Script { commands })
}

fn unexpected(node: &RawNode, wanted: &str) -> SieveError {
    SieveError::Parse {
        line: node.line,
        column: node.column,
        message: format!("Expected {wanted}, found {:?} node", node.kind),
    }
}

fn expect(node: &RawNode, kind: NodeKind) -> Result<()> {
    if node.kind == kind {
        Ok(())
    } else {
        Err(unexpected(node, &format!("{kind:?}")))
    }
}

fn token(node: &RawNode) -> Result<&str> {
    node.token.as_deref().ok_or_else(|| SieveError::Parse {
        line: node.line,
        column: node.column,
        message: format!("{:?} node is missing its token", node.kind),
    })
}

fn build_command(node: &RawNode) -> Result<Command> {
    expect(node, NodeKind::Command)?;
    let name = token(node)?.to_ascii_lowercase();

    let mut arguments = Arguments::default();
    let mut block = None;
    for child in &node.children {
        match child.kind {
            NodeKind::Arguments => arguments = build_arguments(child)?,
            NodeKind::Block => {
                let commands = child
                    .children
                    .iter()
                    .map(build_command)
                    .collect::<Result<Commands>>()?;
                block = Some(Block { commands });
            }
            _ => return Err(unexpected(child, "arguments or block")),
        }
    }

    Ok(Command {
        name,
        arguments,
        block,
        line: node.line,
    })
}

fn build_arguments(node: &RawNode) -> Result<Arguments> {
    let mut arguments = Arguments::default();

    for child in &node.children {
        match child.kind {
            NodeKind::Argument => {
                let value = child
                    .children
                    .first()
                    .ok_or_else(|| unexpected(child, "argument value"))?;
                arguments.positional.push(build_argument(value)?);
            }
            NodeKind::Test => {
                arguments.tests = Some(TestList {
                    tests: vec![build_test(child)?],
                });
            }
            NodeKind::TestList => {
                let tests = child
                    .children
                    .iter()
                    .map(build_test)
                    .collect::<Result<Vec<_>>>()?;
                arguments.tests = Some(TestList { tests });
            }
            _ => return Err(unexpected(child, "argument or test")),
        }
    }

    Ok(arguments)
}

fn build_argument(node: &RawNode) -> Result<Argument> {
    match node.kind {
        NodeKind::String => Ok(Argument::String(token(node)?.to_string())),
        NodeKind::Tag => Ok(Argument::Tag(token(node)?.to_ascii_lowercase())),
        NodeKind::Number => Ok(Argument::Number(parse_number(token(node)?, node.line)?)),
        NodeKind::StringList => {
            let items = node
                .children
                .iter()
                .map(|c| {
                    expect(c, NodeKind::String)?;
                    token(c).map(str::to_string)
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(Argument::StringList(items))
        }
        _ => Err(unexpected(node, "string, number, tag or string list")),
    }
}

fn build_test(node: &RawNode) -> Result<Test> {
    expect(node, NodeKind::Test)?;
    let name = token(node)?.to_ascii_lowercase();
    let arguments = match node.children.first() {
        Some(child) if child.kind == NodeKind::Arguments => build_arguments(child)?,
        Some(child) => return Err(unexpected(child, "arguments")),
        None => Arguments::default(),
    };
    Ok(Test {
        name,
        arguments,
        line: node.line,
    })
}

/// Parses a numeric literal with an optional K, M or G quantifier.
pub fn parse_number(text: &str, line: usize) -> Result<u64> {
    let (digits, scale) = match text.chars().last() {
        Some('K' | 'k') => (&text[..text.len() - 1], KILO),
        Some('M' | 'm') => (&text[..text.len() - 1], MEGA),
        Some('G' | 'g') => (&text[..text.len() - 1], GIGA),
        _ => (text, 1),
    };
    digits
        .parse::<u64>()
        .ok()
        .and_then(|n| n.checked_mul(scale))
        .ok_or_else(|| SieveError::syntax("number", line, format!("Invalid number '{text}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sieve::parser::parse;

    fn build_text(text: &str) -> Script {
        build(&parse(text).unwrap()).unwrap()
    }

    #[test]
    fn test_number_quantifiers() {
        assert_eq!(parse_number("0", 1).unwrap(), 0);
        assert_eq!(parse_number("100K", 1).unwrap(), 102_400);
        assert_eq!(parse_number("2m", 1).unwrap(), 2 * 1_048_576);
        assert_eq!(parse_number("1G", 1).unwrap(), 1_073_741_824);
        assert!(parse_number("99999999999999999999", 1).is_err());
        assert!(parse_number("18446744073709551615G", 1).is_err());
    }

    #[test]
    fn test_single_string_is_not_promoted() {
        let script = build_text(r#"fileinto "Junk"; require ["a"];"#);
        assert_eq!(
            script.commands[0].arguments.positional,
            vec![Argument::String("Junk".to_string())]
        );
        assert_eq!(
            script.commands[1].arguments.positional,
            vec![Argument::StringList(vec!["a".to_string()])]
        );
    }

    #[test]
    fn test_names_are_lowercased_and_lines_kept() {
        let script = build_text("KEEP;\nIf TRUE {\n  Stop;\n}");
        assert_eq!(script.commands[0].name, "keep");
        let if_cmd = &script.commands[1];
        assert_eq!(if_cmd.name, "if");
        assert_eq!(if_cmd.line, 2);
        assert_eq!(if_cmd.arguments.tests()[0].name, "true");
        let block = if_cmd.block.as_ref().unwrap();
        assert_eq!(block.commands[0].name, "stop");
        assert_eq!(block.commands[0].line, 3);
    }

    #[test]
    fn test_test_list_and_nested_test() {
        let script = build_text(r#"if anyof (not true, size :under 10M) { discard; }"#);
        let anyof = &script.commands[0].arguments.tests()[0];
        assert_eq!(anyof.arguments.tests().len(), 2);
        let not = &anyof.arguments.tests()[0];
        assert_eq!(not.arguments.tests()[0].name, "true");
        let size = &anyof.arguments.tests()[1];
        assert_eq!(
            size.arguments.positional,
            vec![Argument::Tag(":under".to_string()), Argument::Number(10 * MEGA)]
        );
    }
}
