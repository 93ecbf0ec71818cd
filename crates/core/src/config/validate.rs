use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Target resolution is nonzero and even (required by the encoder)
/// - Concurrency pools are at least 1
/// - Timeouts are at least 1 second
/// - Directory paths are non-empty
/// - Mediated credentials, when present, are non-empty
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Engine validation
    if config.engine.target_width == 0 || config.engine.target_height == 0 {
        return Err(ConfigError::ValidationError(
            "engine target resolution cannot be 0".to_string(),
        ));
    }
    if config.engine.target_width % 2 != 0 || config.engine.target_height % 2 != 0 {
        return Err(ConfigError::ValidationError(
            "engine target resolution must be even".to_string(),
        ));
    }
    if config.engine.max_parallel_transcodes == 0 {
        return Err(ConfigError::ValidationError(
            "engine.max_parallel_transcodes cannot be 0".to_string(),
        ));
    }
    if config.engine.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "engine.timeout_secs cannot be 0".to_string(),
        ));
    }

    // Downloader validation
    if config.downloader.max_parallel_downloads == 0 {
        return Err(ConfigError::ValidationError(
            "downloader.max_parallel_downloads cannot be 0".to_string(),
        ));
    }
    if config.downloader.stall_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "downloader.stall_timeout_secs cannot be 0".to_string(),
        ));
    }

    // Orchestrator validation
    if config.orchestrator.max_concurrent_batches == 0 {
        return Err(ConfigError::ValidationError(
            "orchestrator.max_concurrent_batches cannot be 0".to_string(),
        ));
    }

    // Paths validation
    for (key, value) in [
        ("paths.downloaded", &config.paths.downloaded),
        ("paths.normalized", &config.paths.normalized),
        ("paths.merged", &config.paths.merged),
        ("paths.scratch", &config.paths.scratch),
    ] {
        if value.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "{key} cannot be empty"
            )));
        }
    }

    // Mediated validation
    if let Some(mediated) = &config.mediated {
        if mediated.api_key.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "mediated.api_key cannot be empty".to_string(),
            ));
        }
        if mediated.api_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "mediated.api_url cannot be empty".to_string(),
            ));
        }
    }

    Ok(())
}
