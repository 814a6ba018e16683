use clap::{App, Arg};

pub fn cli_app<'a, 'b>() -> App<'a, 'b> {
    App::new("beacon_node")
        .version(crate::VERSION)
        .about(
            "The primary component which connects to the Ethereum 2.0 P2P network and \
             downloads, verifies and stores blocks.",
        )
        /*
         * Paths
         */
        .arg(
            Arg::with_name("datadir")
                .long("datadir")
                .value_name("DIR")
                .help("Data directory for the databases and keys")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("database-dir")
                .long("database-dir")
                .value_name("DIR")
                .help("Overrides the location of the chain database")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("validators-dir")
                .long("validators-dir")
                .value_name("DIR")
                .help("Directory for validator keystores and slashing protection")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("secrets-dir")
                .long("secrets-dir")
                .value_name("DIR")
                .help("Directory for validator keystore passwords")
                .takes_value(true),
        )
        /*
         * Network definition
         */
        .arg(
            Arg::with_name("network")
                .long("network")
                .value_name("DIR")
                .help(
                    "Path to a network definition directory, containing the \
                     genesis state and deposit contract details",
                )
                .takes_value(true),
        )
        .arg(
            Arg::with_name("spec")
                .long("spec")
                .value_name("SPEC")
                .help("The protocol preset to run with")
                .possible_values(&["mainnet", "minimal"])
                .default_value("mainnet")
                .takes_value(true),
        )
        /*
         * Eth1
         */
        .arg(
            Arg::with_name("web3-url")
                .long("web3-url")
                .value_name("URL")
                .help("URL of an eth1 JSON-RPC endpoint for deposit monitoring")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("deposit-contract")
                .long("deposit-contract")
                .value_name("ADDRESS")
                .help("Address of the deposit contract on the eth1 chain")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("deposit-contract-deployed-at")
                .long("deposit-contract-deployed-at")
                .value_name("BLOCK")
                .help("Eth1 block number at which the deposit contract was deployed")
                .takes_value(true),
        )
        /*
         * Checkpoints
         */
        .arg(
            Arg::with_name("finalized-checkpoint-state")
                .long("finalized-checkpoint-state")
                .value_name("FILE")
                .help("SSZ file of a finalized state to start from")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("finalized-checkpoint-block")
                .long("finalized-checkpoint-block")
                .value_name("FILE")
                .help("SSZ file of the block matching --finalized-checkpoint-state")
                .takes_value(true)
                .requires("finalized-checkpoint-state"),
        )
        .arg(
            Arg::with_name("weak-subjectivity-checkpoint")
                .long("weak-subjectivity-checkpoint")
                .value_name("ROOT:EPOCH")
                .help("A recent trusted checkpoint the loaded chain must lie within")
                .takes_value(true),
        )
        /*
         * RPC
         */
        .arg(
            Arg::with_name("rpc")
                .long("rpc")
                .help("Enable the HTTP JSON-RPC server"),
        )
        .arg(
            Arg::with_name("rpc-address")
                .long("rpc-address")
                .value_name("ADDRESS")
                .help("Listen address for the RPC server")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("rpc-port")
                .long("rpc-port")
                .value_name("PORT")
                .help("Listen port for the RPC server")
                .takes_value(true),
        )
        /*
         * Metrics
         */
        .arg(
            Arg::with_name("metrics")
                .long("metrics")
                .help("Enable the Prometheus metrics exporter"),
        )
        .arg(
            Arg::with_name("metrics-address")
                .long("metrics-address")
                .value_name("ADDRESS")
                .help("Listen address for the metrics exporter")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("metrics-port")
                .long("metrics-port")
                .value_name("PORT")
                .help("Listen port for the metrics exporter")
                .takes_value(true),
        )
        /*
         * Behaviour
         */
        .arg(
            Arg::with_name("verify-finalization")
                .long("verify-finalization")
                .help("Continuously verify that finalization advances; for testnets"),
        )
        .arg(
            Arg::with_name("stop-at-epoch")
                .long("stop-at-epoch")
                .value_name("EPOCH")
                .help("Shut down cleanly once this epoch is reached")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("graffiti")
                .long("graffiti")
                .value_name("GRAFFITI")
                .help("A string included in proposed blocks, up to 32 bytes")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("node-name")
                .long("node-name")
                .value_name("NAME")
                .help("A name for this node, included in log lines")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("in-process-validators")
                .long("in-process-validators")
                .value_name("BOOL")
                .help("Run attached validators inside the node process")
                .possible_values(&["true", "false"])
                .default_value("true")
                .takes_value(true),
        )
        /*
         * Logging
         */
        .arg(
            Arg::with_name("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .help("The verbosity of the logs")
                .possible_values(&["crit", "error", "warn", "info", "debug", "trace"])
                .default_value("info")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("log-file")
                .long("log-file")
                .value_name("FILE")
                .help("Write logs to this file as well as the terminal")
                .takes_value(true),
        )
}
