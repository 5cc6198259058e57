use coldvault_core::AccountId;

use crate::RetryPolicy;

/// Connection and behaviour settings shared by every command
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    /// Account owning the vaults; `-` for the credentials' own account
    pub account_id: AccountId,

    /// Service region; falls back to the SDK's region provider chain
    pub region: Option<String>,

    /// Endpoint override, e.g. a local test double
    pub endpoint_url: Option<String>,

    /// Retry policy for upload-part requests
    pub retry: RetryPolicy,
}

impl ClientConfig {
    /// Create a new config with defaults
    pub fn new(account_id: AccountId) -> Self {
        Self {
            account_id,
            ..Self::default()
        }
    }

    /// Set the region
    pub fn with_region<S: Into<String>>(mut self, region: S) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Set the endpoint override
    pub fn with_endpoint_url<S: Into<String>>(mut self, url: S) -> Self {
        self.endpoint_url = Some(url.into());
        self
    }

    /// Set the upload-part retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}
