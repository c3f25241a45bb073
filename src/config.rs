//! Settings shared by the services, the CLI and the web server.

/// Tunable limits and policies for the service layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceConfig {
    /// How many slug candidates to try before giving up.
    pub slug_max_attempts: u32,

    /// How many random UIDs to try before giving up.
    pub uid_max_attempts: u32,

    /// The bcrypt cost used when hashing PINs.
    ///
    /// Tests use the minimum cost of 4 to keep them fast.
    pub pin_hash_cost: u32,

    /// Whether creating a transaction dated after the current time is an error.
    pub reject_future_transaction_dates: bool,
}

impl ServiceConfig {
    /// The default number of slug candidates.
    pub const DEFAULT_SLUG_MAX_ATTEMPTS: u32 = 50;
    /// The default number of UID candidates.
    pub const DEFAULT_UID_MAX_ATTEMPTS: u32 = 100;
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            slug_max_attempts: Self::DEFAULT_SLUG_MAX_ATTEMPTS,
            uid_max_attempts: Self::DEFAULT_UID_MAX_ATTEMPTS,
            pin_hash_cost: bcrypt::DEFAULT_COST,
            reject_future_transaction_dates: true,
        }
    }
}

#[cfg(test)]
impl ServiceConfig {
    /// A config with the cheapest PIN hashing, for tests.
    pub(crate) fn for_tests() -> Self {
        Self {
            pin_hash_cost: 4,
            ..Default::default()
        }
    }
}
