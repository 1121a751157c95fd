use super::models::{Config, MAX_SYSLOG_PRIORITY};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Output path must not be empty")]
    EmptyOutputPath,

    #[error("Output path '{0}' does not name a file")]
    OutputPathNotAFile(String),

    #[error("max_size must be positive")]
    ZeroMaxSize,

    #[error("queue_capacity must be positive")]
    ZeroQueueCapacity,

    #[error("Syslog priority {0} is out of range (0..={max})", max = MAX_SYSLOG_PRIORITY)]
    InvalidPriority(u8),

    #[error("Invalid forward pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_output(config)?;
    validate_forward(config)?;
    Ok(())
}

fn validate_output(config: &Config) -> Result<(), ValidationError> {
    let output = &config.output;

    if output.path.as_os_str().is_empty() {
        return Err(ValidationError::EmptyOutputPath);
    }

    if output.path.file_name().is_none() {
        return Err(ValidationError::OutputPathNotAFile(
            output.path.display().to_string(),
        ));
    }

    if output.max_size.as_u64() == 0 {
        return Err(ValidationError::ZeroMaxSize);
    }

    if output.queue_capacity == 0 {
        return Err(ValidationError::ZeroQueueCapacity);
    }

    Ok(())
}

fn validate_forward(config: &Config) -> Result<(), ValidationError> {
    let forward = &config.forward;

    if forward.priority > MAX_SYSLOG_PRIORITY {
        return Err(ValidationError::InvalidPriority(forward.priority));
    }

    if let Some(pattern) = &forward.pattern {
        regex::bytes::Regex::new(pattern).map_err(|source| ValidationError::InvalidPattern {
            pattern: pattern.clone(),
            source,
        })?;

        if forward.target.is_none() {
            tracing::warn!(pattern, "Forward pattern configured without a target, ignoring");
        }
    }

    Ok(())
}
