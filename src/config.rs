use std::path::Path;

use anyhow::Result;
use serde::Deserialize;

/// Defaults for the CLI frontend. The engine itself only sees
/// [`crate::engine::AnalyzeOptions`]; this file feeds those from YAML.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub match_field: String,
    pub match_value: String,
    pub timeout_secs: u64,
}

pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let bytes: Vec<u8> = if let Some(p) = path {
        std::fs::read(p)?
    } else {
        include_bytes!("../config/default.yml").to_vec()
    };
    let config: Config = serde_yaml::from_slice(&bytes)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_default_config_parses() {
        let config = load_config(None).expect("default config");
        assert!(!config.match_field.is_empty());
        assert!(config.timeout_secs > 0);
    }
}
