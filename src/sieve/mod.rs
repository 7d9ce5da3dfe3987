//! RFC 3028 SIEVE interpreter: front end, registries, evaluator and
//! dispatcher.

pub mod ast;
pub mod builder;
pub mod commands;
pub mod comparator;
pub mod conditions;
pub mod context;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod raw;
pub mod registry;
pub mod state;
pub mod validator;
