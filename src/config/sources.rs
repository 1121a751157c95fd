use super::models::Config;
use crate::humanize::ByteSize;
use config::{ConfigError, Environment, File};
use std::env;
use std::path::PathBuf;

const CONFIG_ENV_VAR: &str = "STDIN_ROTATE_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/stdin-rotate.toml";
const ENV_PREFIX: &str = "STDIN_ROTATE";
const ENV_SEPARATOR: &str = "__";

/// Values supplied on the command line; `None` leaves lower layers alone
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub output_path: Option<PathBuf>,
    pub max_size: Option<ByteSize>,
    pub max_files: Option<usize>,
    pub compress: Option<bool>,
    pub forward_target: Option<String>,
    pub forward_pattern: Option<String>,
    pub forward_priority: Option<u8>,
    pub forward_tag: Option<String>,
}

/// Load configuration from multiple sources with priority:
/// 1. Defaults (embedded in structs)
/// 2. TOML file (if exists)
/// 3. Environment variables from .env file (via dotenvy)
/// 4. System environment variables
/// 5. Command-line overrides (highest priority)
pub fn load(config_path: Option<PathBuf>, overrides: &Overrides) -> Result<Config, ConfigError> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let config_path = config_path.unwrap_or_else(|| {
        env::var(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
    });

    load_from_sources(config_path, overrides)
}

/// Load configuration from a specific path, the environment and overrides
pub fn load_from_sources(
    config_path: PathBuf,
    overrides: &Overrides,
) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();

    if config_path.exists() {
        tracing::info!("Loading configuration from: {}", config_path.display());
        builder = builder.add_source(File::from(config_path).required(false));
    } else {
        tracing::debug!(
            "Configuration file not found at {}, using defaults and overrides",
            config_path.display()
        );
    }

    // STDIN_ROTATE__OUTPUT__MAX_SIZE -> output.max_size
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true),
    );

    builder = builder
        .set_override_option(
            "output.path",
            overrides
                .output_path
                .as_ref()
                .map(|p| p.to_string_lossy().into_owned()),
        )?
        .set_override_option("output.max_size", overrides.max_size.map(|s| s.as_u64()))?
        .set_override_option("output.max_files", overrides.max_files.map(|n| n as u64))?
        .set_override_option("output.compress", overrides.compress)?
        .set_override_option("forward.target", overrides.forward_target.clone())?
        .set_override_option("forward.pattern", overrides.forward_pattern.clone())?
        .set_override_option(
            "forward.priority",
            overrides.forward_priority.map(u64::from),
        )?
        .set_override_option("forward.tag", overrides.forward_tag.clone())?;

    builder.build()?.try_deserialize()
}
