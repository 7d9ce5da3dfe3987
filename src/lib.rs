//! A SIEVE (RFC 3028) mail filter interpreter.
//!
//! Scripts are parsed and validated once by an [`Engine`], then evaluated
//! against any number of messages. Each evaluation appends [`Action`]s to the
//! message, which an [`ActionDispatcher`] later carries out through an
//! [`ActionContext`].

pub mod config;
pub mod model;
pub mod sieve;
pub mod store;

pub use config::settings::{EngineConfig, RegistryConfig};
pub use model::action::{Action, Vacation};
pub use model::mail::MailAdapter;
pub use model::message::ParsedMessage;
pub use sieve::ast::Script;
pub use sieve::dispatcher::{ActionContext, ActionDispatcher, Delivery};
pub use sieve::engine::{Engine, EngineBuilder};
pub use sieve::error::{Result, SieveError};
pub use store::folder_store::FolderStore;
pub use store::memory_store::MemoryStore;
