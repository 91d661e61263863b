use crate::utils::error::{Result, ServerError};

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ServerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

/// A bind host is a name or address without a port or path.
pub fn validate_host(field_name: &str, host: &str) -> Result<()> {
    validate_non_empty_string(field_name, host)?;

    if host.contains('\0') || host.contains('/') || host.chars().any(char::is_whitespace) {
        return Err(ServerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: host.to_string(),
            reason: "Host must be a bare hostname or IP address".to_string(),
        });
    }

    // "127.0.0.1:80" carries a port; a bare IPv6 literal like "::1" does not.
    if host.matches(':').count() == 1 {
        return Err(ServerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: host.to_string(),
            reason: "Host must not include a port, use --port instead".to_string(),
        });
    }

    Ok(())
}
