use std::path::Path;

use tracing::{debug, info};

use crate::bench::Repeats;
use crate::error::{AppError, AppResult, ConfigError};

use super::types::{ConfigFile, FixtureConfig};

/// Looked up in the working directory, in order, when `--config` is absent.
const DEFAULT_CONFIG_FILES: [&str; 2] = ["satbench.toml", "satbench.json"];

#[derive(Debug, Clone, Copy)]
enum Format {
    Toml,
    Json,
}

impl Format {
    fn of(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(Format::Toml),
            Some("json") => Ok(Format::Json),
            Some(ext) => Err(ConfigError::UnsupportedExtension {
                ext: ext.to_owned(),
            }),
            None => Err(ConfigError::MissingExtension),
        }
    }
}

/// Loads the `--config` file, or the first default file present.
///
/// # Errors
///
/// Returns an error when the chosen file cannot be read, does not parse, or
/// carries values the benchmark cannot run with.
pub fn load_config(path: Option<&str>) -> AppResult<Option<ConfigFile>> {
    if let Some(path) = path {
        info!("Using config file {}", path);
        return load_config_file(Path::new(path)).map(Some);
    }

    match DEFAULT_CONFIG_FILES
        .iter()
        .map(Path::new)
        .find(|candidate| candidate.exists())
    {
        Some(found) => {
            info!("Using config file {} from the working directory", found.display());
            load_config_file(found).map(Some)
        }
        None => {
            debug!("No config file found; using built-in defaults");
            Ok(None)
        }
    }
}

pub(crate) fn load_config_file(path: &Path) -> AppResult<ConfigFile> {
    let format = Format::of(path)?;
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadConfig {
        path: path.to_path_buf(),
        source,
    })?;
    let file: ConfigFile = match format {
        Format::Toml => toml::from_str(&content).map_err(|source| ConfigError::ParseToml {
            path: path.to_path_buf(),
            source,
        })?,
        Format::Json => serde_json::from_str(&content).map_err(|source| {
            ConfigError::ParseJson {
                path: path.to_path_buf(),
                source,
            }
        })?,
    };
    validate(&file).map_err(AppError::config)?;
    Ok(file)
}

/// Rejects values that would only fail later, against a live server.
fn validate(file: &ConfigFile) -> Result<(), ConfigError> {
    if let Some(repeats) = file.repeats {
        Repeats::try_from(repeats)?;
    }
    if file
        .endpoint
        .as_deref()
        .is_some_and(|endpoint| endpoint.trim().is_empty())
    {
        return Err(invalid("endpoint", "must not be empty"));
    }
    file.fixtures.as_ref().map_or(Ok(()), validate_fixtures)
}

fn validate_fixtures(fixtures: &FixtureConfig) -> Result<(), ConfigError> {
    if fixtures.prefix.trim().is_empty() {
        return Err(invalid("fixtures.prefix", "must not be empty"));
    }
    if fixtures.organizations == 0 {
        return Err(invalid(
            "fixtures.organizations",
            "must be at least 1; content lives in the first organization",
        ));
    }
    if fixtures.entitlement.trim().is_empty() {
        return Err(invalid("fixtures.entitlement", "must not be empty"));
    }
    // An empty pattern would match every entry of the artifact directory.
    if fixtures.artifact_pattern.is_empty() {
        return Err(invalid("fixtures.artifact_pattern", "must not be empty"));
    }
    Ok(())
}

const fn invalid(field: &'static str, reason: &'static str) -> ConfigError {
    ConfigError::InvalidConfigValue { field, reason }
}
