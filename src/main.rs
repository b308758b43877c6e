use anyhow::Context;
use ane_kernel::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load ANE settings")?;
    ane_telemetry::init(&settings.telemetry)?;

    ane_app::app::run(settings).await
}
