pub mod keywords;
pub mod stats;
pub mod store;
pub mod types;

use anyhow::{bail, Result};

/// Number of history entries kept per user.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Caller-supplied input was rejected. Surfaces map this to a client error.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

/// Trim a user id and reject it if nothing is left.
pub fn normalize_user_id(user_id: &str) -> Result<&str> {
    let trimmed = user_id.trim();
    if trimmed.is_empty() {
        bail!(ValidationError("user id must not be empty".into()));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_is_trimmed() {
        assert_eq!(normalize_user_id("  asha ").unwrap(), "asha");
    }

    #[test]
    fn blank_user_id_is_a_validation_error() {
        let err = normalize_user_id("   ").unwrap_err();
        assert!(err.downcast_ref::<ValidationError>().is_some());
    }
}
