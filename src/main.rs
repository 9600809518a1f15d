use toolgate::{
    config::{load_instances, Settings},
    mcp::SseEndpoint,
    plugins, routes, AppState,
};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "toolgate=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::from_env()?;
    let plugin = plugins::for_system(&settings.system)?;
    let config_path = settings.config_path(plugin.name());

    tracing::info!(
        system = %plugin.name(),
        config = %config_path.display(),
        "Loading instance configuration"
    );
    let instances = load_instances(&config_path)?;
    let app_state = AppState::build(&plugin, instances)?;

    tracing::info!(
        tools = app_state.dispatcher.catalogue().len(),
        instances = ?app_state.dispatcher.registry().names(),
        "Gateway ready"
    );

    let sse = SseEndpoint::new(app_state.mcp_service.clone());
    let app = routes::build_router(app_state, &sse);

    let addr = settings.socket_addr();
    tracing::info!("Server running on http://{}", addr);
    tracing::info!("MCP SSE endpoint: http://{}/sse", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let ct = sse.cancellation_token();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
            tracing::info!("Shutting down");
            ct.cancel();
        })
        .await?;

    Ok(())
}
