//! Switchboard 编排服务
//!
//! 入口：加载 .env 与配置、创建路由 LLM 与专家客户端、构建编排引擎，启动 HTTP 服务直到收到关闭信号。

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use switchboard::config::load_config;
use switchboard::core::{ShutdownManager, ShutdownReason};
use switchboard::dispatch::{DispatchClient, SpecialistSet};
use switchboard::graph::GraphEngine;
use switchboard::llm::create_llm_from_config;
use switchboard::observability;
use switchboard::router::LlmRouter;
use switchboard::server::{serve, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    observability::init();

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let cfg = load_config(config_path).context("Failed to load configuration")?;
    cfg.validate().context("Invalid configuration")?;

    let llm = create_llm_from_config(&cfg).context("Failed to create router LLM")?;
    let client = DispatchClient::from_config(&cfg.specialists)
        .context("Failed to build specialist HTTP client")?;
    let specialists = SpecialistSet::remote(Arc::new(client));
    let engine = GraphEngine::new(
        Arc::new(LlmRouter::new(llm)),
        specialists,
        cfg.app.recursion_limit,
    )
    .context("Failed to build orchestration graph")?;

    let shutdown = ShutdownManager::new();
    shutdown.install_signal_handlers();

    let addr = cfg.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!(
        "Switchboard listening on http://{} (recursion limit {})",
        addr,
        engine.recursion_limit()
    );

    if let Err(e) = serve(listener, AppState::new(engine), shutdown.clone()).await {
        shutdown.shutdown(ShutdownReason::FatalError(e.to_string()));
        return Err(e).context("Server error");
    }

    tracing::info!("Switchboard stopped: {:?}", shutdown.reason());
    Ok(())
}
