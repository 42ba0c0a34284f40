mod problem;
mod router;
mod server;
mod telemetry;

use csp_core::SERVICE_TITLE;
use csp_util::{load_env_file, AppConfig};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    load_env_file();
    let config = AppConfig::from_env()?;

    telemetry::init_tracing(&config)?;
    let metrics = telemetry::init_metrics()?;
    let state = router::AppState::new(metrics);

    let listener = TcpListener::bind(config.bind_addr).await?;
    let addr = listener.local_addr()?;
    info!(
        stage = "app",
        %addr,
        env = %config.environment.as_str(),
        title = SERVICE_TITLE,
        "starting HTTP server"
    );

    server::serve(listener, router::app_router(state), server::shutdown_signal()).await?;

    info!(stage = "app", "server stopped");
    Ok(())
}
