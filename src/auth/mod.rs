//! Session handling: logging in and out of a project with an access, and the
//! middleware that guards project routes.

mod cookie;
mod log_in;
mod log_out;
mod middleware;
mod token;

pub(crate) use cookie::DEFAULT_COOKIE_DURATION;
pub use log_in::{LoginState, get_log_in_page, post_log_in};
pub use log_out::get_log_out;
pub use middleware::{AuthState, auth_guard, auth_guard_hx, project_guard, require_write_access};
pub(crate) use cookie::get_token_from_cookies;
