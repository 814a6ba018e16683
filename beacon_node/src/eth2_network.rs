//! Loads a network definition from a directory.
//!
//! A network directory contains up to three files:
//!
//! - `genesis.ssz` — the genesis state, for chains whose genesis is known;
//! - `deposit_contract.txt` — the eth1 address of the deposit contract;
//! - `deposit_contract_block.txt` — the eth1 block it was deployed at.
//!
//! Chains bootstrapping from the deposit contract omit `genesis.ssz`.

use std::fs;
use std::path::Path;

pub const GENESIS_STATE_FILE: &str = "genesis.ssz";
pub const DEPOSIT_CONTRACT_FILE: &str = "deposit_contract.txt";
pub const DEPOSIT_CONTRACT_BLOCK_FILE: &str = "deposit_contract_block.txt";

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Eth2NetworkConfig {
    pub name: String,
    pub genesis_state_bytes: Option<Vec<u8>>,
    pub deposit_contract_address: Option<String>,
    pub deposit_contract_deploy_block: Option<u64>,
}

impl Eth2NetworkConfig {
    pub fn load(dir: &Path) -> Result<Self, String> {
        if !dir.is_dir() {
            return Err(format!(
                "Network directory {} does not exist",
                dir.display()
            ));
        }

        let name = dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "custom".to_string());

        let genesis_state_bytes = match fs::read(dir.join(GENESIS_STATE_FILE)) {
            Ok(bytes) => Some(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(format!("Unable to read {}: {}", GENESIS_STATE_FILE, e)),
        };

        let deposit_contract_address = match fs::read_to_string(dir.join(DEPOSIT_CONTRACT_FILE)) {
            Ok(address) => Some(address.trim().to_string()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(format!("Unable to read {}: {}", DEPOSIT_CONTRACT_FILE, e)),
        };

        let deposit_contract_deploy_block =
            match fs::read_to_string(dir.join(DEPOSIT_CONTRACT_BLOCK_FILE)) {
                Ok(block) => Some(block.trim().parse::<u64>().map_err(|e| {
                    format!("Invalid {}: {}", DEPOSIT_CONTRACT_BLOCK_FILE, e)
                })?),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
                Err(e) => {
                    return Err(format!(
                        "Unable to read {}: {}",
                        DEPOSIT_CONTRACT_BLOCK_FILE, e
                    ))
                }
            };

        Ok(Self {
            name,
            genesis_state_bytes,
            deposit_contract_address,
            deposit_contract_deploy_block,
        })
    }
}
