use beacon_node::{cli_app, get_config, ProductionBeaconNode};
use environment::{Environment, EnvironmentBuilder};
use slog::info;
use std::process::exit;
use task_executor::{advance_node_status, NodeStatus, ShutdownReason};
use types::EthSpec;

fn main() {
    let matches = cli_app().get_matches();

    let result = match matches.value_of("spec") {
        Some("minimal") => EnvironmentBuilder::minimal()
            .single_thread_tokio_runtime()
            .and_then(|builder| builder.async_logger(matches.value_of("log-level").unwrap_or("info")))
            .and_then(|builder| builder.build())
            .and_then(|environment| run(environment, &matches)),
        _ => EnvironmentBuilder::mainnet()
            .single_thread_tokio_runtime()
            .and_then(|builder| builder.async_logger(matches.value_of("log-level").unwrap_or("info")))
            .and_then(|builder| builder.build())
            .and_then(|environment| run(environment, &matches)),
    };

    match result {
        Ok(()) => exit(0),
        Err(e) => {
            eprintln!("Failed to start beacon node: {}", e);
            exit(1);
        }
    }
}

fn run<E: EthSpec>(
    mut environment: Environment<E>,
    matches: &clap::ArgMatches,
) -> Result<(), String> {
    let log = environment.core_log();
    let config = get_config(matches)?;
    let context = environment.core_context();

    info!(
        log, "Starting beacon node";
        "version" => beacon_node::VERSION,
        "data_dir" => %config.data_dir().display(),
    );

    let node = environment
        .runtime()
        .block_on(ProductionBeaconNode::new(context, config))?;

    let reason = environment.block_until_shutdown_requested()?;

    advance_node_status(NodeStatus::Stopping);
    node.stop();
    environment.fire_signal();
    environment.shutdown_on_idle();

    match reason {
        ShutdownReason::Success(_) => Ok(()),
        ShutdownReason::Failure(message) => Err(message.to_string()),
    }
}
