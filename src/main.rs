// float_cmp: only in tests where assert_eq! on f64 is intentional.
#![cfg_attr(test, allow(clippy::float_cmp))]

use anyhow::Result;
use rmcp::ServiceExt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{self, EnvFilter};

use signalscope_mcp::analysis::AnalysisEngine;
use signalscope_mcp::data::cache::FetchCache;
use signalscope_mcp::data::provider::ChartHttpProvider;
use signalscope_mcp::rank::remote::{RemoteRanker, RemoteRankerConfig};
use signalscope_mcp::server::SignalscopeServer;
use signalscope_mcp::store::{DocumentStore, MemoryDocumentStore};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cancel = CancellationToken::new();
    let provider = Arc::new(ChartHttpProvider::from_env(cancel.clone())?);
    let fetch_cache = Arc::new(FetchCache::new(provider));

    // Remote ranker is optional; without it every ranking is rule-based
    let remote_ranker = match RemoteRankerConfig::from_env() {
        Some(config) => {
            tracing::info!("remote ranker configured");
            Some(Arc::new(RemoteRanker::new(config)?))
        }
        None => None,
    };

    let engine = Arc::new(AnalysisEngine::new(fetch_cache, remote_ranker));
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new());

    if let Ok(port) = std::env::var("PORT") {
        // HTTP mode — used by cloud platforms
        use rmcp::transport::streamable_http_server::{
            session::local::LocalSessionManager, StreamableHttpServerConfig, StreamableHttpService,
        };

        let service = StreamableHttpService::new(
            move || Ok(SignalscopeServer::new(engine.clone(), store.clone())),
            LocalSessionManager::default().into(),
            StreamableHttpServerConfig::default(),
        );

        let app = axum::Router::new()
            .nest_service("/mcp", service)
            .route("/health", axum::routing::get(|| async { "ok" }))
            .layer(tower_http::cors::CorsLayer::permissive());

        let addr = format!("0.0.0.0:{port}");
        tracing::info!("Starting signalscope-mcp HTTP server on {addr}");

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown({
                let cancel = cancel.clone();
                async move {
                    let _ = tokio::signal::ctrl_c().await;
                    cancel.cancel();
                }
            })
            .await?;
    } else {
        // stdio mode — used for local development with MCP clients
        tracing::info!("Starting signalscope-mcp MCP server (stdio)");

        let server = SignalscopeServer::new(engine, store);
        let service = server.serve(rmcp::transport::stdio()).await?;
        service.waiting().await?;
        cancel.cancel();
    }

    Ok(())
}
