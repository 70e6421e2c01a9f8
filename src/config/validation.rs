use super::models::Config;
use crate::humanize::ByteSize;
use thiserror::Error;

/// Largest buffer a single download may allocate
pub const MAX_WRITE_BUFFER: ByteSize = ByteSize(64 * 1024 * 1024);

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("fetcher.workers must be at least 1")]
    NoWorkers,

    #[error("fetcher.write_buffer must be at least 1 byte")]
    EmptyWriteBuffer,

    #[error("fetcher.write_buffer is {0}, the limit is {}", MAX_WRITE_BUFFER)]
    WriteBufferTooLarge(ByteSize),

    #[error("fetcher.user_agent must not be empty")]
    EmptyUserAgent,

    #[error("catalog.path must not be empty")]
    EmptyCatalogPath,
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_fetcher(config)?;
    validate_catalog(config)?;
    Ok(())
}

fn validate_fetcher(config: &Config) -> Result<(), ValidationError> {
    if config.fetcher.workers == 0 {
        return Err(ValidationError::NoWorkers);
    }

    if config.fetcher.write_buffer.as_u64() == 0 {
        return Err(ValidationError::EmptyWriteBuffer);
    }

    if config.fetcher.write_buffer > MAX_WRITE_BUFFER {
        return Err(ValidationError::WriteBufferTooLarge(config.fetcher.write_buffer));
    }

    if config.fetcher.user_agent.trim().is_empty() {
        return Err(ValidationError::EmptyUserAgent);
    }

    Ok(())
}

fn validate_catalog(config: &Config) -> Result<(), ValidationError> {
    if config.catalog.path.as_os_str().is_empty() {
        return Err(ValidationError::EmptyCatalogPath);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_valid_config() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_zero_workers() {
        let mut config = Config::default();
        config.fetcher.workers = 0;

        assert!(matches!(validate(&config), Err(ValidationError::NoWorkers)));
    }

    #[test]
    fn test_zero_write_buffer() {
        let mut config = Config::default();
        config.fetcher.write_buffer = ByteSize(0);

        assert!(matches!(
            validate(&config),
            Err(ValidationError::EmptyWriteBuffer)
        ));
    }

    #[test]
    fn test_oversized_write_buffer() {
        let mut config = Config::default();
        config.fetcher.write_buffer = MAX_WRITE_BUFFER;
        assert!(validate(&config).is_ok());

        config.fetcher.write_buffer = ByteSize(4096 * 1024 * 1024 * 1024 * 1024);
        assert!(matches!(
            validate(&config),
            Err(ValidationError::WriteBufferTooLarge(_))
        ));
    }

    #[test]
    fn test_blank_user_agent() {
        let mut config = Config::default();
        config.fetcher.user_agent = "   ".to_string();

        assert!(matches!(
            validate(&config),
            Err(ValidationError::EmptyUserAgent)
        ));
    }

    #[test]
    fn test_empty_catalog_path() {
        let mut config = Config::default();
        config.catalog.path = PathBuf::new();

        assert!(matches!(
            validate(&config),
            Err(ValidationError::EmptyCatalogPath)
        ));
    }
}
