//! Course Library application
//!
//! Feature modules (authors and their courses) mounted on the shared
//! kernel/http stack.

pub mod modules;

use std::sync::Arc;

use axum::Router;
use courselib_kernel::{settings::Settings, InitCtx, ModuleRegistry};
use courselib_store::Store;

/// Build the fully wired application router. The binary and the
/// integration tests share this composition path.
pub async fn app(store: Arc<dyn Store>, settings: &Settings) -> anyhow::Result<Router> {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, store);

    let ctx = InitCtx { settings };
    registry.init_modules(&ctx).await?;

    courselib_http::build_router(&registry, settings).await
}
