//! Service lifecycle: register, init, start, serve, stop.

use std::future::Future;

use anyhow::Context;
use bookshelf_kernel::{settings::Settings, InitCtx, ModuleRegistry};

use crate::{modules, utils};

/// Registry with every application module registered.
pub fn build_registry() -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry);
    registry
}

/// Run the service until Ctrl-C / SIGTERM.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    run_until(settings, utils::shutdown_signal()).await
}

/// Run the service until `shutdown` resolves, then stop every module.
pub async fn run_until<F>(settings: Settings, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    tracing::info!(
        env = ?settings.environment,
        address = %settings.bind_address(),
        "bookshelf bootstrap starting"
    );

    let registry = build_registry();
    let ctx = InitCtx {
        settings: &settings,
    };

    registry.init_modules(&ctx).await?;
    registry.start_modules(&ctx).await?;

    tracing::info!(modules = registry.len(), "bookshelf bootstrap complete");

    let served = bookshelf_http::start_server(&registry, &settings, shutdown).await;

    // Modules are stopped even when the server failed to bind.
    registry
        .stop_modules()
        .await
        .context("failed to stop modules after shutdown")?;

    served
}
