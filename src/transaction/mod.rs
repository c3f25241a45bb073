//! Transactions: recording, querying and deleting movements of money.
//!
//! This module contains:
//! - The `Transaction` model and the `TransactionData` used to create one
//! - The services for creating single and grouped transactions
//! - The `TransactionQuery` filter and the services that run it
//! - The route handlers for the create and delete endpoints

mod core;
mod create;
mod create_page;
mod delete;
mod query;
mod window;

pub use core::{Transaction, TransactionData, TransactionType};
pub use create::{
    MAX_TRANSACTION_AGE_YEARS, create_grouped_transactions, create_single_transaction,
    validate_transaction_data,
};
pub use create_page::{
    CreateTransactionsState, create_transactions_endpoint, get_create_transactions_page,
};
pub use delete::{DeleteTransactionState, delete_transaction, delete_transaction_endpoint};
pub use query::{TransactionQuery, get_project_transactions, get_transactions};
pub use window::DateWindow;
