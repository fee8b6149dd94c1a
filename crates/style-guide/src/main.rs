use std::sync::Arc;

use clap::Parser;
use rmcp::{ServiceExt, transport::stdio};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use style_guide::cache::{self, GuideCache};
use style_guide::cli::{self, Cli, Command};
use style_guide::config::Config;
use style_guide::server::StyleGuideServer;
use style_guide::update::UpdateService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    match Cli::parse().command {
        None | Some(Command::Serve) => serve().await,
        Some(Command::Check(args)) => {
            let report = cli::check(&args)?;
            if !report.is_clean() {
                std::process::exit(1);
            }
            Ok(())
        }
        Some(Command::Toc(args)) => {
            print!("{}", cli::toc(&args)?);
            Ok(())
        }
    }
}

async fn serve() -> anyhow::Result<()> {
    info!("starting style-guide MCP server");

    let config = Config::from_env()?;
    info!(
        guide_path = %config.guide_path.display(),
        lancedb_path = %config.lancedb_path,
        entry_level = config.format.entry_level,
        redis = config.redis_url.is_some(),
        "configuration loaded"
    );

    let redis_cache =
        mcp_common::redis::RedisCache::new(config.redis_url.as_deref(), cache::NAMESPACE);
    if redis_cache.is_available().await {
        info!("redis connected");
    } else {
        info!("redis unavailable, running without cache");
    }
    let cache = Arc::new(GuideCache::new(redis_cache));

    info!("initializing embedding model (may download on first run)");
    let embedder = Arc::new(mcp_common::embedding::Embedder::new().await?);
    info!("embedding model ready");

    let vectordb = Arc::new(mcp_common::vectordb::VectorDb::connect(&config.lancedb_path).await?);
    info!("lancedb connected");

    let update_service = UpdateService::new(
        config.clone(),
        Arc::clone(&embedder),
        Arc::clone(&vectordb),
        Arc::clone(&cache),
    );

    let loaded = if update_service.needs_update().await? {
        info!("indexing style guide (first run or content changed)");
        update_service.full_reindex().await?
    } else {
        info!("style guide up to date, loading from source");
        update_service.load()?
    };
    info!(
        revision = %loaded.revision,
        entries = loaded.index.len(),
        headings = loaded.guide.headings.len(),
        "style guide loaded"
    );

    let server = StyleGuideServer::new(loaded, embedder, vectordb, cache, config);

    if let Ok(addr) = std::env::var("MCP_TCP_LISTEN_ADDR") {
        let listener = TcpListener::bind(&addr).await?;
        info!(listen_addr = %addr, "MCP server ready, serving on TCP");
        loop {
            let (stream, peer) = listener.accept().await?;
            let server = server.clone();
            tokio::spawn(async move {
                tracing::info!(peer = %peer, "MCP client connected");
                let service = server.serve(stream).await.inspect_err(|e| {
                    tracing::error!(error = %e, "MCP server error");
                })?;
                service.waiting().await?;
                tracing::info!(peer = %peer, "MCP client disconnected");
                Ok::<(), anyhow::Error>(())
            });
        }
    } else {
        info!("MCP server ready, serving on stdio");
        let service = server.serve(stdio()).await.inspect_err(|e| {
            tracing::error!(error = %e, "MCP server error");
        })?;
        service.waiting().await?;
        info!("MCP server shut down");
    }
    Ok(())
}
