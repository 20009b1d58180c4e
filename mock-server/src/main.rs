use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mock_server::MockConfig;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mock_server=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let mut config = MockConfig::default();
    if let Ok(api_key) = std::env::var("SHIPSTATION_API_KEY") {
        config.api_key = api_key;
    }
    if let Ok(api_secret) = std::env::var("SHIPSTATION_API_SECRET") {
        config.api_secret = api_secret;
    }

    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, api_key = %config.api_key, "mock ShipStation listening");
    mock_server::run_with(listener, config).await
}
