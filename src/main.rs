use clap::Parser;
use dotenvy::dotenv;
use rust_relay_chat::common::Identity;
use rust_relay_chat::config::{self, AppConfig};
use rust_relay_chat::ui::ChatApp;

#[derive(Parser)]
#[command(
    name = "rust_relay_chat",
    version,
    about = "Desktop client for the relay chat"
)]
struct Cli {
    /// Path to JSON config file
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH, value_name = "FILE")]
    config: String,
    /// Join as this user instead of prompting for a name
    #[arg(long, value_name = "NAME")]
    user: Option<String>,
    /// WebSocket base of the relay, e.g. ws://localhost:8000/ws/chat
    #[arg(long, value_name = "URL")]
    relay_url: Option<String>,
    /// HTTP base of the user directory, e.g. http://localhost:8000
    #[arg(long, value_name = "URL")]
    directory_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), eframe::Error> {
    dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    let app_config = resolve_config(&cli);
    let identity = cli.user.as_deref().and_then(|raw| match Identity::parse(raw) {
        Ok(identity) => Some(identity),
        Err(err) => {
            log::warn!("Ignoring --user: {err}");
            None
        }
    });

    log::info!(
        "Relay at {}, directory at {}",
        app_config.relay_url,
        app_config.directory_url
    );

    let options = eframe::NativeOptions::default();
    eframe::run_native(
        "Rust Relay Chat",
        options,
        Box::new(move |cc| Ok(Box::new(ChatApp::new(cc, app_config, identity)))),
    )
}

/// File, then `CHAT_*` environment, then command-line flags.
fn resolve_config(cli: &Cli) -> AppConfig {
    let mut app_config = config::load_config(&cli.config).with_env_overrides();
    if let Some(url) = &cli.relay_url {
        app_config.relay_url = url.clone();
    }
    if let Some(url) = &cli.directory_url {
        app_config.directory_url = url.clone();
    }
    app_config
}
