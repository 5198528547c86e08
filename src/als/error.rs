use thiserror::Error;

#[derive(Debug, Error)]
pub enum AlsError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("state store failed: {0}")]
    Store(String),
}

impl AlsError {
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::InvalidInput(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_are_distinguished_from_store_failures() {
        assert!(AlsError::NotFound("user u1".to_string()).is_client_error());
        assert!(AlsError::InvalidInput("negative duration".to_string()).is_client_error());
        assert!(!AlsError::Store("connection reset".to_string()).is_client_error());
    }

    #[test]
    fn errors_render_their_category() {
        let err = AlsError::NotFound("user u1".to_string());
        assert_eq!(err.to_string(), "not found: user u1");
    }
}
