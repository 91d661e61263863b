use clap::Parser;
use llamacs::utils::{logger, validation::Validate};
use llamacs::{default_registry, CliConfig, EpcServer};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let config = CliConfig::parse();

    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting llamacs EPC server");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        tracing::error!("Configuration validation failed: {}", e);
        eprintln!("{}", e);
        std::process::exit(1);
    }

    let server = match EpcServer::bind(config.bind_address(), default_registry()).await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to bind {}:{}: {}", config.host, config.port, e);
            eprintln!("Failed to bind {}:{}: {}", config.host, config.port, e);
            std::process::exit(1);
        }
    };

    // The port line is the only thing ever written to stdout.
    if let Err(e) = server.print_port(&mut std::io::stdout().lock()) {
        tracing::error!("Failed to report port: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = server.serve_forever().await {
        tracing::error!("Server stopped: {}", e);
        eprintln!("Server stopped: {}", e);
        std::process::exit(1);
    }
}
