use std::borrow::Cow;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use rust_cli_config::builder::{ConfigBuilder, DefaultState};
use rust_cli_config::{ConfigError, Environment as EnvironmentSource, File};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::environment::Environment;

/// Directory holding configuration files, relative to the application root.
const CONFIGURATION_DIR: &str = "configuration";

/// Extensions tried, in order, for every configuration file.
const CONFIG_FILE_EXTENSIONS: &[&str] = &["yaml", "yml", "json"];

/// Prefix of environment variable overrides.
const ENV_PREFIX: &str = "APP";

const ENV_PREFIX_SEPARATOR: &str = "_";

/// Separator for nested keys in environment variables, as in `APP_WATCHER__TIMEOUT_MS`.
const ENV_SEPARATOR: &str = "__";

const LIST_SEPARATOR: &str = ",";

/// Implemented by top-level configuration structures.
pub trait Config {
    /// Keys whose environment variable values are comma-separated lists.
    const LIST_PARSE_KEYS: &'static [&'static str];
}

#[derive(Debug, Clone, Copy)]
enum ConfigFileKind {
    Base,
    Environment(Environment),
}

impl ConfigFileKind {
    fn stem(&self) -> Cow<'static, str> {
        match self {
            ConfigFileKind::Base => Cow::Borrowed("base"),
            ConfigFileKind::Environment(env) => Cow::Borrowed(env.as_str()),
        }
    }
}

impl fmt::Display for ConfigFileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigFileKind::Base => f.write_str("base configuration"),
            ConfigFileKind::Environment(env) => write!(f, "{env} environment configuration"),
        }
    }
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum LoadConfigError {
    #[error("failed to determine the current directory: {0}")]
    CurrentDir(#[source] io::Error),

    #[error("configuration directory `{0}` does not exist")]
    MissingConfigurationDirectory(PathBuf),

    #[error("could not locate {kind_description} in `{directory}`; attempted: {attempted}")]
    ConfigurationFileMissing {
        kind_description: String,
        directory: PathBuf,
        attempted: String,
    },

    #[error("failed to load {kind_description} from `{path}`: {source}")]
    ConfigurationFileLoad {
        kind_description: String,
        path: PathBuf,
        source: ConfigError,
    },

    #[error("failed to determine runtime environment: {0}")]
    Environment(#[source] io::Error),

    #[error("failed to build configuration: {0}")]
    Builder(#[source] ConfigError),

    #[error("failed to deserialize configuration: {0}")]
    Deserialization(#[source] ConfigError),
}

/// Loads configuration rooted at the current working directory.
///
/// Equivalent to [`load_config_from`] with the current directory.
pub fn load_config<T>() -> Result<T, LoadConfigError>
where
    T: Config + DeserializeOwned,
{
    let base_path = std::env::current_dir().map_err(LoadConfigError::CurrentDir)?;
    load_config_from(&base_path)
}

/// Loads configuration from `{base_path}/configuration`.
///
/// Reads `base.(yaml|yml|json)`, then `{APP_ENVIRONMENT}.(yaml|yml|json)`, then applies
/// `APP_`-prefixed environment variables. Nested keys use double underscores
/// (`APP_WATCHER__TIMEOUT_MS`) and list keys take comma-separated values.
pub fn load_config_from<T>(base_path: &Path) -> Result<T, LoadConfigError>
where
    T: Config + DeserializeOwned,
{
    let configuration_directory = base_path.join(CONFIGURATION_DIR);
    if !configuration_directory.is_dir() {
        return Err(LoadConfigError::MissingConfigurationDirectory(
            configuration_directory,
        ));
    }

    let environment = Environment::load().map_err(LoadConfigError::Environment)?;

    let mut builder = rust_cli_config::Config::builder();
    for kind in [ConfigFileKind::Base, ConfigFileKind::Environment(environment)] {
        let path = find_configuration_file(&configuration_directory, kind)?;
        builder = builder.add_source(File::from(path.clone()));
        validate_configuration_source(&builder, kind, &path)?;
    }

    let mut environment_source = EnvironmentSource::with_prefix(ENV_PREFIX)
        .prefix_separator(ENV_PREFIX_SEPARATOR)
        .separator(ENV_SEPARATOR);

    if !T::LIST_PARSE_KEYS.is_empty() {
        environment_source = environment_source
            .try_parsing(true)
            .list_separator(LIST_SEPARATOR);

        for key in T::LIST_PARSE_KEYS {
            environment_source = environment_source.with_list_parse_key(key);
        }
    }

    builder
        .add_source(environment_source)
        .build()
        .map_err(LoadConfigError::Builder)?
        .try_deserialize::<T>()
        .map_err(LoadConfigError::Deserialization)
}

fn find_configuration_file(
    directory: &Path,
    kind: ConfigFileKind,
) -> Result<PathBuf, LoadConfigError> {
    let stem = kind.stem();
    let candidates: Vec<PathBuf> = CONFIG_FILE_EXTENSIONS
        .iter()
        .map(|extension| directory.join(format!("{stem}.{extension}")))
        .collect();

    if let Some(path) = candidates.iter().find(|path| path.is_file()) {
        return Ok(path.clone());
    }

    let attempted = candidates
        .iter()
        .map(|path| format!("`{}`", path.display()))
        .collect::<Vec<_>>()
        .join(", ");

    Err(LoadConfigError::ConfigurationFileMissing {
        kind_description: kind.to_string(),
        directory: directory.to_path_buf(),
        attempted,
    })
}

/// Builds the sources added so far so a broken file is reported with its own path.
fn validate_configuration_source(
    builder: &ConfigBuilder<DefaultState>,
    kind: ConfigFileKind,
    path: &Path,
) -> Result<(), LoadConfigError> {
    builder
        .build_cloned()
        .map(|_| ())
        .map_err(|source| LoadConfigError::ConfigurationFileLoad {
            kind_description: kind.to_string(),
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::{DaemonConfig, SignalName};
    use std::fs;
    use tempfile::TempDir;

    fn write_configuration(files: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().expect("create temp dir");
        let configuration = dir.path().join(CONFIGURATION_DIR);
        fs::create_dir(&configuration).expect("create configuration dir");
        for (name, contents) in files {
            fs::write(configuration.join(name), contents).expect("write configuration file");
        }
        dir
    }

    #[test]
    fn test_missing_configuration_directory() {
        let dir = TempDir::new().expect("create temp dir");

        let result = load_config_from::<DaemonConfig>(dir.path());

        assert!(matches!(
            result,
            Err(LoadConfigError::MissingConfigurationDirectory(_))
        ));
    }

    #[test]
    fn test_missing_environment_file_lists_attempts() {
        let dir = write_configuration(&[("base.yaml", "watcher:\n  timeout_ms: 100\n")]);

        let Err(LoadConfigError::ConfigurationFileMissing { attempted, .. }) =
            load_config_from::<DaemonConfig>(dir.path())
        else {
            panic!("expected ConfigurationFileMissing");
        };

        assert!(attempted.contains(".yaml"));
        assert!(attempted.contains(".json"));
    }

    #[test]
    fn test_environment_file_overrides_base() {
        let dir = write_configuration(&[
            (
                "base.yaml",
                "watcher:\n  signals: [terminate]\n  timeout_ms: 100\n",
            ),
            ("dev.yaml", "watcher:\n  timeout_ms: 250\n"),
            ("prod.yml", "watcher:\n  timeout_ms: 500\n"),
        ]);

        let config = load_config_from::<DaemonConfig>(dir.path()).expect("load configuration");

        let expected_timeout = match Environment::load().expect("environment") {
            Environment::Dev => 250,
            Environment::Prod => 500,
        };
        assert_eq!(config.watcher.timeout_ms, expected_timeout);
        assert_eq!(config.watcher.signals, vec![SignalName::Terminate]);
    }

    #[test]
    fn test_broken_file_is_reported_with_path() {
        let dir = write_configuration(&[("base.yaml", "watcher: [unclosed\n"), ("dev.yaml", "")]);

        let Err(LoadConfigError::ConfigurationFileLoad { path, .. }) =
            load_config_from::<DaemonConfig>(dir.path())
        else {
            panic!("expected ConfigurationFileLoad");
        };

        assert!(path.ends_with("base.yaml"));
    }
}
