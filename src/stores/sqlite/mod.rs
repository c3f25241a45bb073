//! SQLite implementations of the stores.
//!
//! A single [SQLiteStore] implements every store trait over a shared
//! connection. Each table lives in its own module with the functions to
//! create it and to map its rows.

mod access;
mod account;
mod project;
mod transaction;

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;

use crate::Error;

/// Creates and retrieves projects, accesses, accounts and transactions
/// to/from a SQLite database.
#[derive(Debug, Clone)]
pub struct SQLiteStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteStore {
    /// Create a new store with a SQLite database.
    ///
    /// The tables must already exist, see [initialize].
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }

    /// The shared database connection.
    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        self.connection.clone()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, Error> {
        self.connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)
    }
}

/// Create the tables for every domain model if they do not exist yet.
///
/// Foreign key enforcement is enabled for `connection`.
///
/// # Errors
///
/// Returns an error if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction = connection.unchecked_transaction()?;

    project::create_project_table(&transaction)?;
    access::create_access_table(&transaction)?;
    account::create_account_table(&transaction)?;
    transaction::create_transaction_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

#[cfg(test)]
pub(crate) fn get_test_store() -> SQLiteStore {
    let connection = Connection::open_in_memory().expect("could not open in-memory database");
    initialize(&connection).expect("could not initialize database");

    SQLiteStore::new(Arc::new(Mutex::new(connection)))
}
