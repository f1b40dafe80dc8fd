use std::sync::Arc;

use anyhow::Context;
use courselib_kernel::{settings::Settings, InitCtx, ModuleRegistry};
use courselib_store::{MemoryStore, Store};

use courselib_app::modules;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load course library settings")?;
    courselib_telemetry::init(&settings.telemetry);

    tracing::info!(
        env = ?settings.environment,
        "course library bootstrap starting"
    );

    let store: Arc<dyn Store> = MemoryStore::new_shared();
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, store);

    let ctx = InitCtx {
        settings: &settings,
    };
    registry.init_modules(&ctx).await?;
    registry.start_modules(&ctx).await?;

    courselib_http::start_server(&registry, &settings).await?;

    registry.stop_modules().await?;
    Ok(())
}
