use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use whatspot::api::create_router;
use whatspot::config::Config;
use whatspot::pipeline::RecommendationPipeline;

#[derive(Debug, Parser)]
#[command(name = "whatspot", version, about = "Nearby venue recommendations")]
struct Cli {
    /// Address to listen on. Overrides WHATSPOT_BIND_ADDR.
    #[arg(long)]
    bind: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(true)
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    if let Some(bind) = cli.bind {
        config.bind_addr = bind;
    }

    if config.google_maps_api_key.is_none() {
        tracing::warn!("GOOGLE_MAPS_API_KEY not set; recommendations will fail");
    }
    if config.openai_api_key.is_none() {
        tracing::info!("OPENAI_API_KEY not set; justifications disabled");
    }

    let pipeline = Arc::new(RecommendationPipeline::from_config(&config)?);
    let app = create_router(pipeline);

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!(bind_addr = %config.bind_addr, "whatspot listening");
    axum::serve(listener, app).await?;
    Ok(())
}
