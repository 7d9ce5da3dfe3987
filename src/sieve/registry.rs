//! Name to factory registries for commands, tests and comparators.
//!
//! Registries are filled once while the engine is configured and only read
//! afterwards, so one set can serve any number of concurrent evaluations.

use std::collections::BTreeMap;

use crate::config::settings::RegistryConfig;
use crate::sieve::commands::{self, CommandOp};
use crate::sieve::comparator::{self, Comparator};
use crate::sieve::conditions::{self, TestOp};
use crate::sieve::error::{Result, SieveError};

pub type Factory<T> = fn() -> Box<T>;

/// Commands usable without a `require` declaration.
pub const IMPLICIT_COMMANDS: &[&str] = &[
    "if", "else", "elsif", "require", "stop", "keep", "discard", "redirect",
];

/// Tests usable without a `require` declaration.
pub const IMPLICIT_TESTS: &[&str] = &[
    "address", "allof", "anyof", "exists", "false", "header", "not", "size", "true",
];

/// Comparators usable without a `require` declaration.
pub const IMPLICIT_COMPARATORS: &[&str] = &[comparator::OCTET, comparator::ASCII_CASEMAP];

pub struct Registry<T: ?Sized> {
    entries: BTreeMap<String, Factory<T>>,
    implicit: &'static [&'static str],
}

impl<T: ?Sized> Registry<T> {
    pub fn new(implicit: &'static [&'static str]) -> Self {
        Self {
            entries: BTreeMap::new(),
            implicit,
        }
    }

    pub fn register(&mut self, name: &str, factory: Factory<T>) {
        self.entries.insert(name.to_ascii_lowercase(), factory);
    }

    /// A fresh instance of the implementation registered under `name`.
    pub fn lookup(&self, name: &str) -> Result<Box<T>> {
        self.entries
            .get(&name.to_ascii_lowercase())
            .map(|factory| factory())
            .ok_or_else(|| SieveError::Lookup(name.to_string()))
    }

    pub fn is_supported(&self, name: &str) -> bool {
        self.entries.contains_key(&name.to_ascii_lowercase())
    }

    pub fn is_implicit(&self, name: &str) -> bool {
        self.implicit.iter().any(|i| i.eq_ignore_ascii_case(name))
    }

    /// Registered names that need a `require` declaration, sorted.
    pub fn extensions(&self) -> Vec<String> {
        self.entries
            .keys()
            .filter(|name| !self.is_implicit(name))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub type CommandManager = Registry<dyn CommandOp>;
pub type TestManager = Registry<dyn TestOp>;
pub type ComparatorManager = Registry<dyn Comparator>;

/// The three registries an evaluation resolves names against.
pub struct Registries {
    pub commands: CommandManager,
    pub tests: TestManager,
    pub comparators: ComparatorManager,
}

impl Registries {
    pub fn empty() -> Self {
        Self {
            commands: Registry::new(IMPLICIT_COMMANDS),
            tests: Registry::new(IMPLICIT_TESTS),
            comparators: Registry::new(IMPLICIT_COMPARATORS),
        }
    }

    /// Every implementation the crate ships, under its own name.
    pub fn builtin() -> Self {
        let mut registries = Self::empty();
        for (name, factory) in commands::BUILTIN {
            registries.commands.register(name, *factory);
        }
        for (name, factory) in conditions::BUILTIN {
            registries.tests.register(name, *factory);
        }
        for (name, factory) in comparator_builtins() {
            registries.comparators.register(name, *factory);
        }
        registries
    }

    /// Resolves a name to implementation-identifier mapping against the
    /// built-in catalog. Unknown identifiers fail here, never at evaluation.
    pub fn from_config(config: &RegistryConfig) -> Result<Self> {
        let mut registries = Self::empty();
        for (name, id) in &config.commands {
            registries.commands.register(name, find(commands::BUILTIN, id)?);
        }
        for (name, id) in &config.tests {
            registries.tests.register(name, find(conditions::BUILTIN, id)?);
        }
        for (name, id) in &config.comparators {
            registries.comparators.register(name, find(comparator_builtins(), id)?);
        }
        Ok(registries)
    }

    /// Union of non-implicit names; comparators are reported as `comparator-<name>`.
    pub fn extensions(&self) -> Vec<String> {
        let mut names = self.commands.extensions();
        names.extend(self.tests.extensions());
        names.extend(
            self.comparators
                .extensions()
                .into_iter()
                .map(|name| format!("comparator-{name}")),
        );
        names.sort();
        names.dedup();
        names
    }
}

fn find<T: ?Sized>(catalog: &[(&str, Factory<T>)], id: &str) -> Result<Factory<T>> {
    catalog
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(id))
        .map(|(_, factory)| *factory)
        .ok_or_else(|| SieveError::Lookup(id.to_string()))
}

fn comparator_builtins() -> &'static [(&'static str, Factory<dyn Comparator>)] {
    COMPARATORS
}

const COMPARATORS: &[(&str, Factory<dyn Comparator>)] = &[
    (comparator::OCTET, octet),
    (comparator::ASCII_CASEMAP, ascii_casemap),
];

fn octet() -> Box<dyn Comparator> {
    Box::new(comparator::Octet)
}

fn ascii_casemap() -> Box<dyn Comparator> {
    Box::new(comparator::AsciiCasemap)
}

/// Identifiers of every built-in implementation, by registry.
pub fn builtin_ids() -> (Vec<&'static str>, Vec<&'static str>, Vec<&'static str>) {
    (
        commands::BUILTIN.iter().map(|(name, _)| *name).collect(),
        conditions::BUILTIN.iter().map(|(name, _)| *name).collect(),
        comparator_builtins().iter().map(|(name, _)| *name).collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::enums::MatchType;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let registries = Registries::builtin();
        assert!(registries.commands.is_supported("FileInto"));
        assert!(registries.commands.lookup("KEEP").is_ok());
        assert!(registries.tests.lookup("Header").is_ok());
        let casemap = registries.comparators.lookup("I;ASCII-CASEMAP").unwrap();
        assert!(casemap.compare(MatchType::Is, "a", "A"));
    }

    #[test]
    fn test_unknown_name_is_lookup_error() {
        let registries = Registries::builtin();
        assert!(matches!(
            registries.commands.lookup("frobnicate"),
            Err(SieveError::Lookup(name)) if name == "frobnicate"
        ));
        assert!(!registries.tests.is_supported("regex"));
    }

    #[test]
    fn test_extensions_exclude_implicit_names() {
        let registries = Registries::builtin();
        let extensions = registries.extensions();
        assert_eq!(extensions, vec!["envelope", "fileinto", "log", "reject", "vacation"]);
    }

    #[test]
    fn test_from_config_rejects_unknown_ids() {
        let mut config = RegistryConfig::default();
        config
            .commands
            .insert("archive".to_string(), "no-such-impl".to_string());
        assert!(matches!(
            Registries::from_config(&config),
            Err(SieveError::Lookup(id)) if id == "no-such-impl"
        ));
    }

    #[test]
    fn test_from_config_aliases() {
        let mut config = RegistryConfig::default();
        config
            .commands
            .insert("move".to_string(), "fileinto".to_string());
        let registries = Registries::from_config(&config).unwrap();
        assert!(registries.commands.is_supported("move"));
        assert!(registries.extensions().contains(&"move".to_string()));
    }

    #[test]
    fn test_custom_comparator_is_advertised() {
        fn reverse() -> Box<dyn Comparator> {
            Box::new(comparator::Octet)
        }

        let mut registries = Registries::builtin();
        registries.comparators.register("i;reverse", reverse);
        assert!(registries
            .extensions()
            .contains(&"comparator-i;reverse".to_string()));
    }
}
