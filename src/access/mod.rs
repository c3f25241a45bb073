//! Project accesses and the credentials used to log in with them.

mod core;
pub mod pin;

pub use core::{Access, CreatedAccess, authenticate, create_access};
pub use pin::PinHash;
