#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("API key is empty")]
    EmptyApiKey,
    #[error("zone name is empty")]
    EmptyZoneName,
}

/// The key is opaque: only an empty one is refused here, the remote
/// check decides the rest.
pub fn validate_api_key(key: &str) -> Result<(), ValidationError> {
    if key.is_empty() {
        return Err(ValidationError::EmptyApiKey);
    }

    Ok(())
}

pub fn validate_zone_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyZoneName);
    }

    Ok(())
}
