// src/main.rs
// chat-relay - streaming chat relay for the Gemini API

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use chat_relay::config::Config;
use chat_relay::gemini::GeminiClient;
use chat_relay::relay;

#[derive(Parser)]
#[command(name = "chat-relay")]
#[command(about = "Streaming chat relay for the Gemini generative-language API")]
#[command(version)]
struct Cli {
    /// Port to listen on (overrides PORT)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file, if present
    dotenvy::dotenv().ok();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    if let Some(port) = cli.port {
        config.port = port;
    }

    info!("Starting chat relay");
    info!("Text model:   {}", config.text_model);
    info!("Vision model: {}", config.vision_model);

    let generator = Arc::new(GeminiClient::with_models(
        config.api_key.clone(),
        config.text_model.clone(),
        config.vision_model.clone(),
    ));

    relay::run(config, generator).await
}
