use std::process::ExitCode;
use std::sync::Arc;

use botsync::config::Config;
use botsync::dispatch::LoopExit;
use botsync::node::Node;
use botsync::transport::irc;
use botsync::workers::{MathsWorker, WorkExecutor};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration (.env first, then the environment)
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    // Connect to the server
    let (mut reader, sender) = match irc::connect(&config.server, config.port).await {
        Ok(connection) => connection,
        Err(e) => {
            tracing::error!(error = %e, server = %config.server, "Failed to connect");
            return ExitCode::FAILURE;
        }
    };

    let executors: Vec<Arc<dyn WorkExecutor>> = vec![Arc::new(MathsWorker::new())];
    let node = Node::new(config, sender, executors);

    match node.run(&mut reader).await {
        Ok(LoopExit::Closed) => {
            tracing::info!("Connection closed");
            ExitCode::SUCCESS
        }
        Ok(LoopExit::Shutdown) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Node failed");
            ExitCode::FAILURE
        }
    }
}
