use chat_relay::{RelayHub, router};
use clap::Parser;
use dotenvy::dotenv;
use tokio::net::TcpListener;
use tokio::signal;

#[derive(Parser)]
#[command(name = "chat-relay", version, about = "Message relay and user directory for the chat client")]
struct Args {
    /// Interface to bind
    #[arg(long, default_value = "localhost")]
    host: String,
    /// Port for both the WebSocket relay and the directory
    #[arg(long, default_value_t = 8000)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    log::info!("Starting chat relay...");

    let hub = RelayHub::shared();
    let listener = TcpListener::bind((args.host.as_str(), args.port)).await?;
    log::info!("Relay listening on {}", listener.local_addr()?);

    tokio::select! {
        result = axum::serve(listener, router(hub.clone())) => {
            if let Err(err) = result {
                log::error!("Relay server error: {}", err);
            }
        }
        _ = signal::ctrl_c() => {
            log::info!("Received shutdown signal, stopping relay...");
        }
    }

    let hub = hub.lock().await;
    log::info!(
        "Final statistics: {} connected users, {} stored messages",
        hub.connected_count(),
        hub.history_len()
    );

    Ok(())
}
