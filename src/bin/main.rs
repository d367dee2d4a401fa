use reya_plugin::{
    completion::{TextCompletion, UnavailableCompletion},
    gemini::GeminiClient,
    runtime::{ActionResult, CollectedReplies, Message},
    PluginConfig, ReyaPlugin,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = PluginConfig::from_env()?;
    info!(base_url = %config.base_url, "Reya connectivity check");

    let model: Arc<dyn TextCompletion> = match config.gemini_api_key.clone() {
        Some(key) => Arc::new(GeminiClient::new(key)?),
        None => {
            warn!("GEMINI_API_KEY not set, intent classification will use keywords only");
            Arc::new(UnavailableCompletion)
        }
    };

    let plugin = ReyaPlugin::new(config, model)?;

    let markets = plugin.service().markets().await?;
    println!("✅ Reachable: {} markets listed", markets.len());

    let text = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    if text.trim().is_empty() {
        return Ok(());
    }

    let message = Message::new(Uuid::new_v4(), text);
    let mut sink = CollectedReplies::default();

    match plugin.handle_message(&message, &mut sink).await? {
        ActionResult::Replied { action, .. } => {
            println!("\n=== {} ===", action);
            for reply in sink.replies {
                println!("{}", reply);
            }
        }
        ActionResult::Unhandled => println!("\n(no Reya action claimed this message)"),
    }

    Ok(())
}
