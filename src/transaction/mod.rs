//! The ledger of dated expenses.

mod db;
mod domain;
mod endpoints;

pub use db::{
    create_transaction, create_transaction_table, delete_transaction, get_transaction,
    get_transactions_for_user, update_transaction,
};
pub use domain::{
    Transaction, TransactionBuilder, TransactionForm, TransactionId, parse_transaction_date,
};
pub use endpoints::{
    TransactionEndpointState, create_transaction_endpoint, delete_transaction_endpoint,
    get_transactions_endpoint, update_transaction_endpoint,
};
