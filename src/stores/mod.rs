//! Contains traits and implementations for objects that store the domain models.
//!
//! Every trait has two implementations: [InMemoryStore], used by tests, and
//! [SQLiteStore], used by the CLI and the web server. Both satisfy the same
//! contract, including the filtering and ordering of transaction queries.

mod access;
mod account;
mod memory;
mod project;
mod transaction;

pub mod sqlite;

pub use access::AccessStore;
pub use account::AccountStore;
pub use memory::InMemoryStore;
pub use project::ProjectStore;
pub use sqlite::SQLiteStore;
pub use transaction::TransactionStore;
