use tokio::{net::UdpSocket, sync::broadcast};
use tracing::{error, info};

/// Broadcasts once when the process receives Ctrl-C.
pub async fn create_shutdown_channel() -> broadcast::Receiver<()> {
    let (shutdown_sender, shutdown_receiver): (broadcast::Sender<()>, broadcast::Receiver<()>) =
        broadcast::channel::<()>(1);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for ctrl-c: {}", e);
            return;
        }
        info!("signal received, shutting down");
        // Nobody listening means the client already exited
        let _ = shutdown_sender.send(());
    });
    shutdown_receiver
}

// A local address with a currently unused port. Nothing listens on it until someone binds it.
pub async fn random_address() -> String {
    let socket = UdpSocket::bind("127.0.0.1:0")
        .await
        .expect("Failed to get random port");
    socket
        .local_addr()
        .expect("Failed to unwrap local address")
        .to_string()
}
