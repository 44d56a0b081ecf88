// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! File and environment settings of the final state.
//!
//! Sources are merged in this order, later ones overriding earlier ones:
//! 1. the file at `BONDING_CONFIG_PATH` (`base_config/config.toml` by default);
//! 2. the file at `BONDING_CONFIG_OVERRIDE_PATH` (`config/config.toml` by default), if it exists;
//! 3. environment variables prefixed with `BONDING_`, nested keys separated by `__`.

use crate::config::{FinalStateConfig, InitialBalance};
use crate::error::{FinalStateError, FinalStateResult};
use bonding_db_exports::DBConfig;
use bonding_slashing::SlashingConfig;
use bonding_staking_exports::StakingConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "BONDING";

/// Settings read from the configuration files
#[derive(Debug, Clone, Deserialize)]
pub struct FinalStateSettings {
    /// path of the state database
    pub db_path: PathBuf,
    /// number of committed change sets kept in memory
    pub max_history_length: usize,
    /// staking parameters
    pub staking: StakingConfig,
    /// slashing parameters
    pub slashing: SlashingConfig,
    /// balances minted by the first block
    #[serde(default)]
    pub initial_balances: Vec<InitialBalance>,
}

impl FinalStateSettings {
    /// Loads the settings from the paths found in the environment
    pub fn from_env() -> FinalStateResult<Self> {
        let config_path = std::env::var("BONDING_CONFIG_PATH")
            .unwrap_or_else(|_| "base_config/config.toml".to_string());
        let override_path = std::env::var("BONDING_CONFIG_OVERRIDE_PATH")
            .unwrap_or_else(|_| "config/config.toml".to_string());
        Self::load(Path::new(&config_path), Some(Path::new(&override_path)))
    }

    /// Loads the settings from `config_path`, then `override_path` if it is a file, then
    /// the environment
    pub fn load(config_path: &Path, override_path: Option<&Path>) -> FinalStateResult<Self> {
        let mut builder =
            config::Config::builder().add_source(config::File::from(config_path.to_path_buf()));
        if let Some(override_path) = override_path {
            if override_path.is_file() {
                builder = builder.add_source(config::File::from(override_path.to_path_buf()));
            }
        }
        builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .and_then(|settings| settings.try_deserialize())
            .map_err(|err| FinalStateError::SettingsError(err.to_string()))
    }

    /// Database configuration
    pub fn db_config(&self) -> DBConfig {
        DBConfig {
            path: self.db_path.clone(),
            max_history_length: self.max_history_length,
        }
    }

    /// Final state configuration
    pub fn final_state_config(&self) -> FinalStateConfig {
        FinalStateConfig {
            staking: self.staking.clone(),
            slashing: self.slashing.clone(),
            initial_balances: self.initial_balances.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bonding_models::{Address, Amount, Dec};
    use bonding_time::BondingTime;
    use std::str::FromStr;
    use tempfile::TempDir;

    #[test]
    fn test_load_base_config() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("base_config/config.toml");
        let settings = FinalStateSettings::load(&path, None).unwrap();
        assert_eq!(settings.max_history_length, 100);
        assert_eq!(settings.staking.max_validators, 100);
        assert_eq!(settings.staking.power_reduction, Amount::from_raw(1_000_000));
        assert_eq!(
            settings.staking.unbonding_time,
            BondingTime::from_millis(21 * 24 * 3600 * 1000)
        );
        assert_eq!(
            settings.slashing.slash_fraction_double_sign,
            Dec::from_str("0.05").unwrap()
        );
        assert!(settings.initial_balances.is_empty());
    }

    #[test]
    fn test_override_file() {
        let temp_dir = TempDir::new().expect("Unable to create a temp folder");
        let address = Address::from_module_name("genesis");
        let override_path = temp_dir.path().join("override.toml");
        std::fs::write(
            &override_path,
            format!(
                "[staking]\nmax_validators = 4\n\n[[initial_balances]]\naddress = \"{}\"\namount = \"500\"\n",
                address
            ),
        )
        .unwrap();

        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("base_config/config.toml");
        let settings = FinalStateSettings::load(&path, Some(&override_path)).unwrap();
        assert_eq!(settings.staking.max_validators, 4);
        assert_eq!(settings.staking.max_entries, 7);
        assert_eq!(
            settings.final_state_config().initial_balances,
            vec![InitialBalance {
                address,
                amount: Amount::from_raw(500),
            }]
        );

        // a missing override file is skipped
        let missing = temp_dir.path().join("missing.toml");
        let settings = FinalStateSettings::load(&path, Some(&missing)).unwrap();
        assert_eq!(settings.staking.max_validators, 100);
    }

    #[test]
    fn test_paths_from_env() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("base_config/config.toml");
        std::env::set_var("BONDING_CONFIG_PATH", &path);
        std::env::set_var("BONDING_CONFIG_OVERRIDE_PATH", "/nonexistent/config.toml");
        let settings = FinalStateSettings::from_env().unwrap();
        assert_eq!(settings.slashing.validator_update_delay, 1);
        assert_eq!(settings.db_config().max_history_length, 100);
    }

    #[test]
    fn test_missing_config_file() {
        let temp_dir = TempDir::new().expect("Unable to create a temp folder");
        let result = FinalStateSettings::load(&temp_dir.path().join("none.toml"), None);
        assert!(matches!(result, Err(FinalStateError::SettingsError(_))));
    }
}
