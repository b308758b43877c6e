pub mod models;

use ane_kernel::settings::Settings;
use ane_kernel::ModuleRegistry;

/// Register all project-specific modules with the registry
pub fn register_all(registry: &mut ModuleRegistry, settings: &Settings) -> anyhow::Result<()> {
    registry.register(models::create_module(&settings.catalog)?)?;
    Ok(())
}
