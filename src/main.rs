mod common;
mod config;
mod headless;
mod network;
mod ui;

use clap::{Parser, Subcommand};
use common::SessionId;
use dotenvy::dotenv;
use network::{HubClient, WebSocketTransport};
use tokio::sync::mpsc;
use ui::ChatApp;

#[derive(Parser)]
#[command(
    name = "hub_chat",
    version,
    about = "Chat client for a real-time messaging hub"
)]
struct Cli {
    /// Path to JSON config file
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH, value_name = "FILE")]
    config: String,
    /// Server base url; the hub is reached at `<URL>/hub`
    #[arg(long, value_name = "URL")]
    server_url: Option<String>,
    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Subcommand, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Chat from the terminal: stdin lines are sent, messages are printed
    Headless,
}

#[tokio::main]
async fn main() -> Result<(), eframe::Error> {
    dotenv().ok();
    // Khởi tạo Logger để debug
    env_logger::init();

    let cli = Cli::parse();
    let mut app_config = config::load_config(&cli.config);
    app_config.apply_env_overrides(|key| std::env::var(key).ok());
    if let Some(server_url) = cli.server_url {
        app_config.server_url = server_url;
    }

    let hub_url = match app_config.hub_endpoint() {
        Ok(url) => url,
        Err(err) => {
            log::error!("Cannot start chat: {err}");
            std::process::exit(2);
        }
    };

    // Định danh phiên: cố định trong suốt vòng đời tiến trình
    let session_id = SessionId::generate();

    // 1. Tạo các kênh giao tiếp (Channels)
    // UI -> Hub client
    let (cmd_tx, cmd_rx) = mpsc::channel(100);
    // Hub client -> UI
    let (event_tx, event_rx) = mpsc::channel(100);

    // 2. Khởi chạy Hub client (Chạy ngầm)
    log::info!("Connecting to hub at {hub_url}");
    let transport = WebSocketTransport::new(hub_url, app_config.transport_options());
    let client = HubClient::new(
        transport,
        session_id,
        app_config.retry_delay(),
        event_tx,
        cmd_rx,
    );
    tokio::spawn(client.run());

    if cli.mode == Some(Mode::Headless) {
        if let Err(err) = headless::run(cmd_tx, event_rx).await {
            log::error!("Headless chat terminated: {err}");
        }
        return Ok(());
    }

    // 3. Khởi chạy UI (Chạy trên Main Thread)
    let options = eframe::NativeOptions::default();
    let mut event_rx = Some(event_rx);

    eframe::run_native(
        "Hub Chat",
        options,
        Box::new(move |cc| {
            let event_receiver = event_rx
                .take()
                .expect("ChatApp should only be initialized once");

            log::info!("Client started with session {session_id}");

            Ok(Box::new(ChatApp::new(
                cc,
                session_id,
                cmd_tx.clone(),
                event_receiver,
            )))
        }),
    )
}
