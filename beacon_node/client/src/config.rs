use serde_derive::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use types::{Checkpoint, Graffiti};

/// Default directory name for the data dir, placed under the user's home.
pub const DEFAULT_ROOT_DIR: &str = ".beacon-node";

const DEFAULT_SLASHING_PROTECTION_DIR: &str = "slashing_protection";

/// Defines how the client should obtain its initial chain state.
///
/// Variants are listed in resolution priority order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum ClientGenesis {
    /// A user-supplied finalized checkpoint: an SSZ state and, unless the
    /// state sits at slot zero, its matching block.
    Checkpoint {
        state_bytes: Vec<u8>,
        block_bytes: Option<Vec<u8>>,
    },
    /// The genesis state baked into the network definition.
    GenesisState { state_bytes: Vec<u8> },
    /// Connect to an eth1 node and wait until the deposit contract produces
    /// a viable genesis.
    #[default]
    DepositContract,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcConfig {
    pub enabled: bool,
    pub address: String,
    pub port: u16,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            address: "127.0.0.1".to_string(),
            port: 9190,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub address: String,
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            address: "127.0.0.1".to_string(),
            port: 8008,
        }
    }
}

/// The core configuration of a beacon node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    data_dir: PathBuf,
    /// Name of the directory inside the data directory where the main
    /// database is located.
    pub db_name: String,
    /// Overrides the database location entirely, if set.
    pub database_dir: Option<PathBuf>,
    pub validators_dir: Option<PathBuf>,
    pub secrets_dir: Option<PathBuf>,
    /// A name appearing in log lines, for operators running several nodes.
    pub node_name: Option<String>,
    /// Graffiti to be inserted everytime we create a block.
    pub graffiti: Graffiti,
    /// The `genesis` field is not serialized or deserialized by `serde` to
    /// ensure it is defined via the CLI at runtime, instead of from a
    /// configuration file saved to disk.
    #[serde(skip)]
    pub genesis: ClientGenesis,
    pub web3_url: Option<String>,
    pub deposit_contract_address: Option<String>,
    pub deposit_contract_deployed_at: Option<u64>,
    pub weak_subjectivity_checkpoint: Option<Checkpoint>,
    /// Continuously verify that finalization advances sanely; expensive,
    /// for testing deployments.
    pub verify_finalization: bool,
    /// Shut down cleanly once this epoch is reached.
    pub stop_at_epoch: Option<u64>,
    /// Run the validator client inside the node process instead of as a
    /// sidecar.
    pub in_process_validators: bool,
    pub rpc: RpcConfig,
    pub metrics: MetricsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_ROOT_DIR),
            db_name: "chain_db".to_string(),
            database_dir: None,
            validators_dir: None,
            secrets_dir: None,
            node_name: None,
            graffiti: Graffiti::default(),
            genesis: ClientGenesis::default(),
            web3_url: None,
            deposit_contract_address: None,
            deposit_contract_deployed_at: None,
            weak_subjectivity_checkpoint: None,
            verify_finalization: false,
            stop_at_epoch: None,
            in_process_validators: true,
            rpc: RpcConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Config {
    /// Updates the data directory for the client.
    pub fn set_data_dir(&mut self, data_dir: PathBuf) {
        self.data_dir = data_dir;
    }

    pub fn data_dir(&self) -> &PathBuf {
        &self.data_dir
    }

    /// Get the database path without initialising it.
    pub fn get_db_path(&self) -> PathBuf {
        self.database_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join(&self.db_name))
    }

    /// The directory holding per-validator minimum-attesting-slot records.
    pub fn slashing_protection_path(&self) -> PathBuf {
        self.validators_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("validators"))
            .join(DEFAULT_SLASHING_PROTECTION_DIR)
    }

    /// Returns the core path for the client, creating it if it does not
    /// exist.
    pub fn create_data_dir(&self) -> Result<PathBuf, String> {
        ensure_dir_exists(self.data_dir.clone())
    }
}

/// Ensure that the directory at `path` exists, by creating it and all
/// parents if necessary.
fn ensure_dir_exists(path: PathBuf) -> Result<PathBuf, String> {
    fs::create_dir_all(&path).map_err(|e| format!("Unable to create {}: {}", path.display(), e))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde() {
        let config = Config::default();
        let serialized =
            serde_yaml::to_string(&config).expect("should serde encode default config");
        serde_yaml::from_str::<Config>(&serialized).expect("should serde decode default config");
    }

    #[test]
    fn db_path_override() {
        let mut config = Config::default();
        config.set_data_dir(PathBuf::from("/tmp/node"));
        assert_eq!(config.get_db_path(), PathBuf::from("/tmp/node/chain_db"));

        config.database_dir = Some(PathBuf::from("/mnt/fast/db"));
        assert_eq!(config.get_db_path(), PathBuf::from("/mnt/fast/db"));
    }
}
