use std::path::Path;

use sigwatch_config::shared::DaemonConfig;
use sigwatch_config::{load_config, load_config_from};

use crate::error::{DaemonError, DaemonResult};

/// Loads and validates the daemon configuration.
///
/// Configuration files are looked up under `base_dir/configuration`, or under the current
/// directory when no base directory is given.
pub fn load_daemon_config(base_dir: Option<&Path>) -> DaemonResult<DaemonConfig> {
    let config = match base_dir {
        Some(base_dir) => load_config_from::<DaemonConfig>(base_dir),
        None => load_config::<DaemonConfig>(),
    }
    .map_err(DaemonError::config)?;
    config.validate().map_err(DaemonError::config)?;

    Ok(config)
}
