//! Defines the core transaction model.

use std::{fmt::Display, str::FromStr};

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    database_id::{AccountId, GroupId, TransactionId},
};

// ============================================================================
// MODELS
// ============================================================================

/// The direction money moves in a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    /// Money leaving the account.
    #[serde(rename = "debit")]
    Debit,
    /// Money added to the account.
    #[serde(rename = "top-up")]
    TopUp,
}

impl TransactionType {
    /// Every transaction type, in display order.
    pub fn all() -> [TransactionType; 2] {
        [TransactionType::Debit, TransactionType::TopUp]
    }

    /// The canonical name, "debit" or "top-up".
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Debit => "debit",
            TransactionType::TopUp => "top-up",
        }
    }

    /// The factor a transaction value is multiplied by when computing a balance.
    pub fn sign(&self) -> f64 {
        match self {
            TransactionType::Debit => -1.0,
            TransactionType::TopUp => 1.0,
        }
    }
}

impl FromStr for TransactionType {
    type Err = Error;

    /// Parse a transaction type, also accepting "topup" and "top_up" for top-ups.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "debit" => Ok(TransactionType::Debit),
            "top-up" | "topup" | "top_up" => Ok(TransactionType::TopUp),
            _ => Err(Error::InvalidTransactionType(s.to_owned())),
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: Error| FromSqlError::Other(Box::new(error)))
    }
}

/// The user supplied fields of a transaction that has not been created yet.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionData {
    /// The account the money moves in or out of.
    pub account_id: AccountId,
    /// The amount of money. Must be greater than zero, the direction is
    /// given by `transaction_type`.
    pub value: f64,
    /// A short description.
    pub name: String,
    /// Whether the money leaves or enters the account.
    pub transaction_type: TransactionType,
    /// When the transaction happened. Defaults to the time of creation.
    pub transaction_date: Option<OffsetDateTime>,
}

/// A single movement of money in or out of an account.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The account the transaction belongs to.
    pub account_id: AccountId,
    /// The amount of money, always greater than zero.
    pub value: f64,
    /// A short description.
    pub name: String,
    /// Whether the money left or entered the account.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// When the transaction happened.
    #[serde(with = "time::serde::rfc3339")]
    pub transaction_date: OffsetDateTime,
    /// Shared by all transactions created in the same batch.
    pub group_id: Option<GroupId>,
    /// When the transaction was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the transaction was last updated.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Transaction {
    /// Create a transaction from `data` with a fresh ID, created at `now`.
    ///
    /// `data` is not validated here.
    pub fn new(data: TransactionData, group_id: Option<GroupId>, now: OffsetDateTime) -> Self {
        Self {
            id: TransactionId::new(),
            account_id: data.account_id,
            value: data.value,
            name: data.name,
            transaction_type: data.transaction_type,
            transaction_date: data.transaction_date.unwrap_or(now),
            group_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// The value with the sign of the transaction type applied.
    pub fn signed_value(&self) -> f64 {
        self.transaction_type.sign() * self.value
    }
}
