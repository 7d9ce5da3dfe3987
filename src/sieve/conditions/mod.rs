//! Tests: boolean predicates evaluated against a message.

pub mod address;
pub mod header;
pub mod logical;
pub mod size;

use crate::model::enums::{AddressPart, MatchType};
use crate::model::mail::MailAdapter;
use crate::sieve::ast::{Argument, Test};
use crate::sieve::comparator;
use crate::sieve::context::EvalContext;
use crate::sieve::error::{Result, SieveError};
use crate::sieve::registry::Factory;

pub trait TestOp {
    fn validate_arguments(&self, test: &Test) -> Result<()>;

    fn call(&self, test: &Test, mail: &dyn MailAdapter, ctx: &mut EvalContext) -> Result<bool>;
}

pub const BUILTIN: &[(&str, Factory<dyn TestOp>)] = &[
    ("address", address::address_test),
    ("envelope", address::envelope_test),
    ("header", header::header_test),
    ("exists", header::exists_test),
    ("size", size::size_test),
    ("not", logical::not_test),
    ("allof", logical::allof_test),
    ("anyof", logical::anyof_test),
    ("true", logical::true_test),
    ("false", logical::false_test),
];

/// Optional tags and the two string lists shared by `header`, `address`
/// and `envelope`:
/// `[:comparator <name>] [address-part] [match-type] <names> <keys>`.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchArguments {
    pub comparator: String,
    pub match_type: MatchType,
    pub address_part: AddressPart,
    pub names: Vec<String>,
    pub keys: Vec<String>,
}

impl MatchArguments {
    pub fn parse(test: &Test, allow_address_part: bool) -> Result<Self> {
        let syntax = |message: String| SieveError::syntax(&test.name, test.line, message);
        if test.arguments.tests.is_some() {
            return Err(syntax("Test does not take nested tests".to_string()));
        }

        let mut comparator = None;
        let mut match_type = None;
        let mut address_part = None;
        let mut lists = Vec::new();
        let mut args = test.arguments.positional.iter();

        while let Some(arg) = args.next() {
            match arg {
                Argument::Tag(tag) if !lists.is_empty() => {
                    return Err(syntax(format!("Tag {tag} must precede the string lists")));
                }
                Argument::Tag(tag) if tag == ":comparator" => {
                    let name = args
                        .next()
                        .and_then(Argument::as_string)
                        .ok_or_else(|| syntax("Expected a comparator name".to_string()))?;
                    if comparator.replace(name.to_ascii_lowercase()).is_some() {
                        return Err(syntax("Duplicate :comparator".to_string()));
                    }
                }
                Argument::Tag(tag) => {
                    if let Some(m) = MatchType::from_sieve(tag) {
                        if match_type.replace(m).is_some() {
                            return Err(syntax("Duplicate match type".to_string()));
                        }
                    } else if let Some(p) =
                        AddressPart::from_sieve(tag).filter(|_| allow_address_part)
                    {
                        if address_part.replace(p).is_some() {
                            return Err(syntax("Duplicate address part".to_string()));
                        }
                    } else {
                        return Err(syntax(format!("Unknown tag {tag}")));
                    }
                }
                other => match other.as_string_list() {
                    Some(list) => lists.push(list),
                    None => {
                        return Err(syntax(format!(
                            "Expected a string list, found a {}",
                            other.describe()
                        )))
                    }
                },
            }
        }

        let [names, keys]: [Vec<String>; 2] = lists.try_into().map_err(|lists: Vec<_>| {
            syntax(format!("Expected two string lists, found {}", lists.len()))
        })?;

        Ok(Self {
            comparator: comparator.unwrap_or_else(|| comparator::ASCII_CASEMAP.to_string()),
            match_type: match_type.unwrap_or_default(),
            address_part: address_part.unwrap_or_default(),
            names,
            keys,
        })
    }
}

/// Exactly one string or string list and nothing else.
pub(crate) fn single_string_list(test: &Test) -> Result<Vec<String>> {
    let syntax = |message: &str| SieveError::syntax(&test.name, test.line, message);
    if test.arguments.tests.is_some() {
        return Err(syntax("Test does not take nested tests"));
    }
    match test.arguments.positional.as_slice() {
        [arg] => arg
            .as_string_list()
            .ok_or_else(|| syntax("Expected a string list")),
        _ => Err(syntax("Expected exactly one string list")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sieve::ast::Arguments;

    fn test_with(positional: Vec<Argument>) -> Test {
        Test {
            name: "address".to_string(),
            arguments: Arguments {
                positional,
                tests: None,
            },
            line: 3,
        }
    }

    fn tag(t: &str) -> Argument {
        Argument::Tag(t.to_string())
    }

    fn string(s: &str) -> Argument {
        Argument::String(s.to_string())
    }

    #[test]
    fn test_defaults() {
        let parsed = MatchArguments::parse(&test_with(vec![string("From"), string("x")]), true)
            .unwrap();
        assert_eq!(parsed.comparator, "i;ascii-casemap");
        assert_eq!(parsed.match_type, MatchType::Is);
        assert_eq!(parsed.address_part, AddressPart::All);
        assert_eq!(parsed.names, vec!["From"]);
        assert_eq!(parsed.keys, vec!["x"]);
    }

    #[test]
    fn test_tags_in_any_order() {
        let parsed = MatchArguments::parse(
            &test_with(vec![
                tag(":domain"),
                tag(":comparator"),
                string("I;Octet"),
                tag(":contains"),
                Argument::StringList(vec!["From".to_string(), "To".to_string()]),
                string("example.com"),
            ]),
            true,
        )
        .unwrap();
        assert_eq!(parsed.comparator, "i;octet");
        assert_eq!(parsed.match_type, MatchType::Contains);
        assert_eq!(parsed.address_part, AddressPart::Domain);
        assert_eq!(parsed.names.len(), 2);
    }

    #[test]
    fn test_rejects_malformed() {
        let bad = [
            vec![string("From")],
            vec![tag(":is"), tag(":contains"), string("a"), string("b")],
            vec![tag(":regex"), string("a"), string("b")],
            vec![string("a"), tag(":is"), string("b")],
            vec![tag(":comparator"), string("a")],
            vec![Argument::Number(5), string("b")],
        ];
        for positional in bad {
            assert!(
                matches!(
                    MatchArguments::parse(&test_with(positional.clone()), true),
                    Err(SieveError::Syntax { line: 3, .. })
                ),
                "{positional:?}"
            );
        }

        let header_only = test_with(vec![tag(":domain"), string("From"), string("x")]);
        assert!(MatchArguments::parse(&header_only, false).is_err());
    }
}
