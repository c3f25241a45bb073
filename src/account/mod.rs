//! Accounts belonging to a project.

mod core;
mod create_page;

pub use core::{Account, create_account};
pub use create_page::{CreateAccountState, create_account_endpoint, get_create_account_page};
