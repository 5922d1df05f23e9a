use pgbridge_config::load_config;
use pgbridge_config::shared::BridgeConfig;

use crate::error::{IngestError, IngestResult};

/// Loads and validates the bridge configuration.
///
/// Uses the standard configuration loading mechanism from [`pgbridge_config`]
/// and validates the resulting [`BridgeConfig`] before returning it.
pub fn load_bridge_config() -> IngestResult<BridgeConfig> {
    let config = load_config::<BridgeConfig>().map_err(IngestError::config)?;
    config.validate().map_err(IngestError::config)?;

    Ok(config)
}
