//! Resolves the CLI matches (and any network definition) into a
//! `ClientConfig`, rejecting contradictory combinations.

use crate::eth2_network::Eth2NetworkConfig;
use clap::ArgMatches;
use client::{ClientConfig, ClientGenesis};
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use types::{Checkpoint, Epoch, Graffiti, Hash256};

/// Default directory name under the user's home directory.
pub const DEFAULT_ROOT_DIR: &str = ".beacon-node";

pub fn get_config(matches: &ArgMatches) -> Result<ClientConfig, String> {
    let mut config = ClientConfig::default();

    let data_dir = matches
        .value_of("datadir")
        .map(PathBuf::from)
        .or_else(|| dirs::home_dir().map(|home| home.join(DEFAULT_ROOT_DIR)))
        .ok_or("Unable to determine a data directory; pass --datadir")?;
    config.set_data_dir(data_dir);

    if let Some(dir) = matches.value_of("database-dir") {
        config.database_dir = Some(PathBuf::from(dir));
    }
    if let Some(dir) = matches.value_of("validators-dir") {
        config.validators_dir = Some(PathBuf::from(dir));
    }
    if let Some(dir) = matches.value_of("secrets-dir") {
        config.secrets_dir = Some(PathBuf::from(dir));
    }
    if let Some(name) = matches.value_of("node-name") {
        config.node_name = Some(name.to_string());
    }
    if let Some(graffiti) = matches.value_of("graffiti") {
        if graffiti.len() > types::graffiti::GRAFFITI_BYTES_LEN {
            return Err(format!(
                "Your graffiti is too long! {} bytes is the maximum",
                types::graffiti::GRAFFITI_BYTES_LEN
            ));
        }
        config.graffiti = Graffiti::from(graffiti);
    }

    let network = matches
        .value_of("network")
        .map(|dir| Eth2NetworkConfig::load(&PathBuf::from(dir)))
        .transpose()?;

    // A field supplied by the network definition must not also be passed on
    // the command line; silently preferring one over the other hides
    // misconfiguration.
    if let Some(network) = &network {
        if network.deposit_contract_address.is_some() && matches.is_present("deposit-contract") {
            return Err(
                "--deposit-contract conflicts with the deposit contract of --network".to_string(),
            );
        }
        if network.deposit_contract_deploy_block.is_some()
            && matches.is_present("deposit-contract-deployed-at")
        {
            return Err(
                "--deposit-contract-deployed-at conflicts with the deploy block of --network"
                    .to_string(),
            );
        }
    }

    config.web3_url = matches.value_of("web3-url").map(str::to_string);
    config.deposit_contract_address = matches
        .value_of("deposit-contract")
        .map(str::to_string)
        .or_else(|| {
            network
                .as_ref()
                .and_then(|network| network.deposit_contract_address.clone())
        });
    config.deposit_contract_deployed_at = matches
        .value_of("deposit-contract-deployed-at")
        .map(|block| block.parse::<u64>().map_err(|e| format!("Invalid deploy block: {}", e)))
        .transpose()?
        .or_else(|| {
            network
                .as_ref()
                .and_then(|network| network.deposit_contract_deploy_block)
        });

    // Genesis source, in priority order: user checkpoint, baked-in genesis
    // state, live deposit-contract monitoring.
    config.genesis = if let Some(state_path) = matches.value_of("finalized-checkpoint-state") {
        let state_bytes = fs::read(state_path)
            .map_err(|e| format!("Unable to read checkpoint state {}: {}", state_path, e))?;
        let block_bytes = matches
            .value_of("finalized-checkpoint-block")
            .map(|block_path| {
                fs::read(block_path).map_err(|e| {
                    format!("Unable to read checkpoint block {}: {}", block_path, e)
                })
            })
            .transpose()?;
        ClientGenesis::Checkpoint {
            state_bytes,
            block_bytes,
        }
    } else if let Some(state_bytes) = network
        .as_ref()
        .and_then(|network| network.genesis_state_bytes.clone())
    {
        ClientGenesis::GenesisState { state_bytes }
    } else {
        if config.web3_url.is_none() {
            return Err(
                "The genesis state is unknown and no --web3-url is configured to await \
                 deposit-contract genesis"
                    .to_string(),
            );
        }
        if config.deposit_contract_address.is_none() {
            return Err(
                "The genesis state is unknown and no deposit contract is configured".to_string(),
            );
        }
        ClientGenesis::DepositContract
    };

    if let Some(checkpoint) = matches.value_of("weak-subjectivity-checkpoint") {
        config.weak_subjectivity_checkpoint = Some(parse_wss_checkpoint(checkpoint)?);
    }

    config.verify_finalization = matches.is_present("verify-finalization");
    config.stop_at_epoch = matches
        .value_of("stop-at-epoch")
        .map(|epoch| epoch.parse::<u64>().map_err(|e| format!("Invalid epoch: {}", e)))
        .transpose()?;
    config.in_process_validators = matches.value_of("in-process-validators") != Some("false");

    config.rpc.enabled = matches.is_present("rpc");
    if let Some(address) = matches.value_of("rpc-address") {
        config.rpc.address = address.to_string();
    }
    if let Some(port) = matches.value_of("rpc-port") {
        config.rpc.port = port
            .parse::<u16>()
            .map_err(|e| format!("Invalid RPC port: {}", e))?;
    }

    config.metrics.enabled = matches.is_present("metrics");
    if let Some(address) = matches.value_of("metrics-address") {
        config.metrics.address = address.to_string();
    }
    if let Some(port) = matches.value_of("metrics-port") {
        config.metrics.port = port
            .parse::<u16>()
            .map_err(|e| format!("Invalid metrics port: {}", e))?;
    }

    Ok(config)
}

/// Parses a `block_root:epoch` weak-subjectivity checkpoint.
fn parse_wss_checkpoint(input: &str) -> Result<Checkpoint, String> {
    let (root_str, epoch_str) = input
        .split_once(':')
        .ok_or("Weak subjectivity checkpoint must take the form 0x<root>:<epoch>")?;

    let root_hex = root_str
        .strip_prefix("0x")
        .ok_or("Checkpoint root must have a 0x prefix")?;
    let root_bytes =
        hex::decode(root_hex).map_err(|e| format!("Invalid checkpoint root: {}", e))?;
    if root_bytes.len() != 32 {
        return Err("Checkpoint root must be 32 bytes".to_string());
    }

    let epoch = u64::from_str(epoch_str).map_err(|e| format!("Invalid checkpoint epoch: {}", e))?;

    Ok(Checkpoint {
        epoch: Epoch::new(epoch),
        root: Hash256::from_slice(&root_bytes),
    })
}
