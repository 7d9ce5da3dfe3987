//! Static checks run once over a built script, before any message is seen.

use std::collections::BTreeSet;

use crate::sieve::ast::{Argument, Arguments, Command, Commands, Script, Test};
use crate::sieve::commands::control::COMPARATOR_PREFIX;
use crate::sieve::error::{Result, SieveError};
use crate::sieve::registry::{Registries, IMPLICIT_COMPARATORS};

/// Rejects misplaced `require`s, unknown command and test names, unsupported
/// required features and undeclared comparators.
pub fn validate(script: &Script, registries: &Registries) -> Result<()> {
    let mut validator = Validator {
        registries,
        declared: IMPLICIT_COMPARATORS
            .iter()
            .map(|name| name.to_string())
            .collect(),
        in_prolog: true,
    };
    validator.top_level(&script.commands)
}

struct Validator<'r> {
    registries: &'r Registries,
    declared: BTreeSet<String>,
    in_prolog: bool,
}

impl Validator<'_> {
    fn top_level(&mut self, commands: &Commands) -> Result<()> {
        for command in commands {
            if command.name == "require" {
                if !self.in_prolog {
                    return Err(SieveError::validation(
                        command.line,
                        "'require' must come before any other command",
                    ));
                }
                self.require(command)?;
            } else {
                self.in_prolog = false;
                self.command(command)?;
            }
        }
        Ok(())
    }

    fn nested(&mut self, commands: &Commands) -> Result<()> {
        for command in commands {
            if command.name == "require" {
                return Err(SieveError::validation(
                    command.line,
                    "'require' is not allowed inside a block",
                ));
            }
            self.command(command)?;
        }
        Ok(())
    }

    fn require(&mut self, command: &Command) -> Result<()> {
        for argument in &command.arguments.positional {
            let Some(features) = argument.as_string_list() else {
                continue;
            };
            for feature in features {
                let feature = feature.to_ascii_lowercase();
                match feature.strip_prefix(COMPARATOR_PREFIX) {
                    Some(comparator) => {
                        if !self.registries.comparators.is_supported(comparator) {
                            return Err(SieveError::validation(
                                command.line,
                                format!("Unsupported comparator \"{comparator}\""),
                            ));
                        }
                        self.declared.insert(comparator.to_string());
                    }
                    None => {
                        if !self.registries.commands.is_supported(&feature)
                            && !self.registries.tests.is_supported(&feature)
                        {
                            return Err(SieveError::validation(
                                command.line,
                                format!("Unsupported feature \"{feature}\""),
                            ));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn command(&mut self, command: &Command) -> Result<()> {
        if !self.registries.commands.is_supported(&command.name) {
            return Err(SieveError::validation(
                command.line,
                format!("Unknown command \"{}\"", command.name),
            ));
        }
        self.arguments(&command.arguments, command.line)?;
        if let Some(block) = &command.block {
            self.nested(&block.commands)?;
        }
        Ok(())
    }

    fn test(&mut self, test: &Test) -> Result<()> {
        if !self.registries.tests.is_supported(&test.name) {
            return Err(SieveError::validation(
                test.line,
                format!("Unknown test \"{}\"", test.name),
            ));
        }
        self.arguments(&test.arguments, test.line)
    }

    fn arguments(&mut self, arguments: &Arguments, line: usize) -> Result<()> {
        let mut positional = arguments.positional.iter();
        while let Some(argument) = positional.next() {
            if argument.as_tag() != Some(":comparator") {
                continue;
            }
            // A missing or malformed name is left to the command's own checks
            if let Some(Argument::String(name)) = positional.next() {
                if !self.declared.contains(&name.to_ascii_lowercase()) {
                    return Err(SieveError::validation(
                        line,
                        format!("Comparator \"{name}\" is used without being required"),
                    ));
                }
            }
        }
        for test in arguments.tests() {
            self.test(test)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sieve::{builder, parser};

    fn check(source: &str) -> Result<()> {
        let script = builder::build(&parser::parse(source).unwrap()).unwrap();
        validate(&script, &Registries::builtin())
    }

    #[test]
    fn test_require_prolog() {
        assert!(check("require \"fileinto\"; require [\"reject\", \"envelope\"]; keep;").is_ok());
        assert!(matches!(
            check("fileinto \"x\"; require \"fileinto\";"),
            Err(SieveError::Validation { line: 1, .. })
        ));
        assert!(matches!(
            check("if true { require \"fileinto\"; }"),
            Err(SieveError::Validation { .. })
        ));
    }

    #[test]
    fn test_unknown_names() {
        assert!(check("require \"imap4flags\";").is_err());
        assert!(check("frobnicate;").is_err());
        assert!(check("if regex \"a\" \"b\" { keep; }").is_err());
        assert!(check("if not anyof (true, bogus) { keep; }").is_err());
        assert!(check("if true { if true { frob; } }").is_err());
    }

    #[test]
    fn test_comparator_declarations() {
        assert!(check(
            "if header :comparator \"i;octet\" \"Subject\" \"x\" { keep; }"
        )
        .is_ok());
        assert!(check(
            "if header :comparator \"i;ascii-numeric\" \"Subject\" \"1\" { keep; }"
        )
        .is_err());
        assert!(check("require \"comparator-i;ascii-numeric\";").is_err());
        assert!(check("require \"comparator-i;octet\"; keep;").is_ok());
    }

    #[test]
    fn test_empty_script() {
        assert!(check("").is_ok());
    }
}
