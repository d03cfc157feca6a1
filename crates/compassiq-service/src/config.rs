//! Service configuration.

/// Configuration for the operation layer.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Invite lifetime in days (default: 7).
    pub invite_expiry_days: i64,
    /// Stand-in principal used when no session principal exists.
    /// `None` disables the dev bypass; production leaves this unset.
    pub dev_principal: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            invite_expiry_days: 7,
            dev_principal: None,
        }
    }
}
