//! Server bootstrap shared by the `ane-app` binary and `ane serve`.

use anyhow::Context;
use ane_kernel::settings::Settings;
use ane_kernel::{InitCtx, ModuleRegistry};

use crate::modules;

/// Build the registry, run module lifecycles around the HTTP server.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    tracing::info!(
        env = ?settings.environment,
        upstream = %settings.catalog.base_url,
        "ane-app bootstrap starting"
    );

    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, &settings)
        .context("failed to register modules")?;

    let ctx = InitCtx {
        settings: &settings,
    };
    registry.init_modules(&ctx).await?;
    registry.start_modules(&ctx).await?;

    tracing::info!("ane-app bootstrap complete");

    let served = ane_http::start_server(&registry, &settings).await;
    registry.stop_modules().await?;
    served
}
