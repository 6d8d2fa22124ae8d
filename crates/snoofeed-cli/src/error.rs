use snoofeed_core::CoreError;
use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] snoofeed_core::ValidationError),

    #[error(transparent)]
    Fetch(#[from] snoofeed_core::FetchError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<CoreError> for CliError {
    fn from(error: CoreError) -> Self {
        match error {
            CoreError::Validation(inner) => Self::Validation(inner),
            CoreError::Fetch(inner) => Self::Fetch(inner),
            CoreError::Serialization(inner) => Self::Serialization(inner),
        }
    }
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 2,
            Self::Fetch(_) => 3,
            Self::Serialization(_) => 4,
            Self::Io(_) => 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snoofeed_core::{FetchError, ValidationError};

    #[test]
    fn exit_codes_distinguish_error_categories() {
        let validation = CliError::from(ValidationError::EmptyQuery);
        assert_eq!(validation.exit_code(), 2);

        let fetch = CliError::from(FetchError::not_found("gone"));
        assert_eq!(fetch.exit_code(), 3);
    }
}
