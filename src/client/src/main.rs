use checkers_client::{config::ClientConfig, entrypoint::run};
use common::utility::create_shutdown_channel;
use tracing::error;

#[tokio::main]
async fn main() {
    let config = ClientConfig::from_env();
    tracing_subscriber::fmt()
        .with_line_number(true)
        .with_file(true)
        .with_max_level(config.log_level)
        .with_writer(std::io::stderr)
        .init();
    let shutdown_receiver = create_shutdown_channel().await;
    if let Err(e) = run(config, shutdown_receiver).await {
        error!("Client exited with error: {}", e);
        std::process::exit(1);
    }
}
