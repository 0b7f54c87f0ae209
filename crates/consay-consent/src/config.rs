//! Consent service configuration.

use crate::error::ConsentError;

/// Configuration for the consent service.
#[derive(Debug, Clone)]
pub struct ConsentConfig {
    /// Public base URL used when building approval links
    /// (e.g., `https://consay.app`). No trailing slash.
    pub base_url: String,
    /// Length of generated public record slugs (default: 12).
    pub slug_length: usize,
    /// Approval token validity window in days (default: 30).
    pub token_ttl_days: i64,
}

impl Default for ConsentConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".into(),
            slug_length: 12,
            token_ttl_days: 30,
        }
    }
}

impl ConsentConfig {
    /// Reject zero or out-of-range parameters before the service is
    /// constructed.
    pub fn validate(&self) -> Result<(), ConsentError> {
        if self.base_url.is_empty() {
            return Err(ConsentError::Validation("base_url must not be empty".into()));
        }
        if self.slug_length == 0 {
            return Err(ConsentError::Validation(
                "slug_length must be at least 1".into(),
            ));
        }
        if self.token_ttl_days <= 0 {
            return Err(ConsentError::Validation(
                "token_ttl_days must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(ConsentConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_slug_length_rejected() {
        let config = ConsentConfig {
            slug_length: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn non_positive_ttl_rejected() {
        let config = ConsentConfig {
            token_ttl_days: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
