//! Deleting transactions.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use rusqlite::Connection;

use crate::{
    AppState, Error,
    database_id::TransactionId,
    endpoints::{self, format_endpoint},
    project::Project,
    stores::{AccountStore, SQLiteStore, TransactionStore},
};

/// Permanently delete a transaction.
///
/// # Errors
///
/// Returns [Error::TransactionNotFound] if there is no such transaction, or
/// any error from the store.
pub fn delete_transaction(
    transaction_id: TransactionId,
    transactions: &impl TransactionStore,
) -> Result<(), Error> {
    transactions.get_by_id(transaction_id)?;
    transactions.delete_by_id(transaction_id)?;
    tracing::info!("Deleted transaction {transaction_id}");

    Ok(())
}

/// The state needed to delete a transaction.
#[derive(Debug, Clone)]
pub struct DeleteTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for deleting a transaction of the current project, redirects to the dashboard.
///
/// Transactions of accounts in other projects are reported as not found.
pub async fn delete_transaction_endpoint(
    State(state): State<DeleteTransactionState>,
    Extension(project): Extension<Project>,
    Path((_, transaction_id)): Path<(String, TransactionId)>,
) -> Result<Response, Error> {
    let store = SQLiteStore::new(state.db_connection);

    let transaction = TransactionStore::get_by_id(&store, transaction_id)?;
    let account = AccountStore::get_by_id(&store, transaction.account_id)?;
    if account.project_id != project.id {
        tracing::warn!(
            "Refused to delete transaction {transaction_id} from outside project {}",
            project.slug
        );
        return Err(Error::TransactionNotFound);
    }

    delete_transaction(transaction_id, &store)?;

    Ok((
        HxRedirect(format_endpoint(endpoints::DASHBOARD_VIEW, &[&project.slug])),
        StatusCode::SEE_OTHER,
    )
        .into_response())
}
