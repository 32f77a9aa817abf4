// Config file loading

use std::path::Path;

use reckoning_recon::{ReconConfig, ReconError};

/// Read and validate a `.toml` config file.
pub fn load_config(path: &Path) -> Result<ReconConfig, ReconError> {
    let input = std::fs::read_to_string(path)
        .map_err(|e| ReconError::Io(format!("cannot read config {}: {e}", path.display())))?;
    ReconConfig::from_toml(&input)
}
